use crate::block::BlockType;

use super::types::SlashCommand;

pub(super) const CMD: SlashCommand = SlashCommand {
    name: "Heading 3",
    description: "Small section heading.",
    icon: "H3",
    block_type: BlockType::Heading3,
};
