use crate::block::{BlockId, BlockType};

#[derive(Debug, Clone, PartialEq)]
pub struct SlashCommand {
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub block_type: BlockType,
}

impl SlashCommand {
    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.name.to_lowercase().contains(&q) || self.description.to_lowercase().contains(&q)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlashMenuState {
    pub block_id: BlockId, // block holding the '/' trigger
    pub query: String,
    pub commands: Vec<SlashCommand>,
    pub selected: usize,
}
