use crate::block::BlockType;

use super::types::SlashCommand;

pub(super) const CMD: SlashCommand = SlashCommand {
    name: "Bulleted List",
    description: "Create a simple bulleted list.",
    icon: "•",
    block_type: BlockType::BulletedList,
};
