use crate::model::CommandNode;

/// Per-command state rebuilt at each level of a traversal.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub command: &'a CommandNode,
    pub info_name: &'a str,
    pub parent: Option<&'a RenderContext<'a>>,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        command: &'a CommandNode,
        info_name: &'a str,
        parent: Option<&'a RenderContext<'a>>,
    ) -> Self {
        Self {
            command,
            info_name,
            parent,
        }
    }

    /// Space-joined path from the root program to this command.
    pub fn command_path(&self) -> String {
        match self.parent {
            Some(parent) => format!("{} {}", parent.command_path(), self.info_name),
            None => self.info_name.to_string(),
        }
    }

    /// Command path with spaces replaced by hyphens, used in anchor labels.
    pub fn anchor_path(&self) -> String {
        self.command_path().replace(' ', "-")
    }
}
