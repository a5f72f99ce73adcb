use crate::block::BlockType;

use super::types::SlashCommand;

pub(super) const CMD: SlashCommand = SlashCommand {
    name: "Quote",
    description: "Capture a quote.",
    icon: "“",
    block_type: BlockType::Quote,
};
