use crate::block::BlockType;

use super::types::SlashCommand;

pub(super) const CMD: SlashCommand = SlashCommand {
    name: "Checklist",
    description: "Track tasks with a to-do list.",
    icon: "☑",
    block_type: BlockType::Checklist,
};
