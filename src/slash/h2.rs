use crate::block::BlockType;

use super::types::SlashCommand;

pub(super) const CMD: SlashCommand = SlashCommand {
    name: "Heading 2",
    description: "Medium section heading.",
    icon: "H2",
    block_type: BlockType::Heading2,
};
