use crate::block::BlockType;

use super::types::SlashCommand;

pub(super) const CMD: SlashCommand = SlashCommand {
    name: "Code",
    description: "Capture a code snippet.",
    icon: "<>",
    block_type: BlockType::Code,
};
