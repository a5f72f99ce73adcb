use crate::block::BlockType;

use super::types::SlashCommand;

pub(super) const CMD: SlashCommand = SlashCommand {
    name: "Numbered List",
    description: "Create a list with numbering.",
    icon: "1.",
    block_type: BlockType::NumberedList,
};
