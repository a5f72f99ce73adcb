use crate::block::BlockType;

use super::types::SlashCommand;

pub(super) const CMD: SlashCommand = SlashCommand {
    name: "Heading 1",
    description: "Big section heading.",
    icon: "H1",
    block_type: BlockType::Heading1,
};
