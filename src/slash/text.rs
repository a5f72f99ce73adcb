use crate::block::BlockType;

use super::types::SlashCommand;

pub(super) const CMD: SlashCommand = SlashCommand {
    name: "Text",
    description: "Just start writing with plain text.",
    icon: "T",
    block_type: BlockType::Text,
};
