use crate::block::BlockType;

use super::types::SlashCommand;

pub(super) const CMD: SlashCommand = SlashCommand {
    name: "Toggle",
    description: "Collapsible content block.",
    icon: "▸",
    block_type: BlockType::Toggle,
};
