use crate::block::BlockType;

use super::types::SlashCommand;

pub(super) const CMD: SlashCommand = SlashCommand {
    name: "Divider",
    description: "Visual separator between blocks.",
    icon: "---",
    block_type: BlockType::Divider,
};
