use derive_builder::Builder;
use enumflags2::BitFlags;
use log::trace;

use crate::repository::MailboxAttribute;

/// One LIST response line.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub name: String,
    pub delimiter: Option<String>,
    pub attributes: BitFlags<MailboxAttribute>,
}

#[derive(Builder, Debug, Clone, PartialEq)]
pub struct MailboxNode {
    /// Last path segment.
    #[builder(setter(into))]
    pub name: String,
    #[builder(setter(into, strip_option), default)]
    pub delimiter: Option<String>,
    #[builder(default)]
    pub attributes: BitFlags<MailboxAttribute>,
    #[builder(default)]
    pub children: Vec<MailboxNode>,
}

impl MailboxNode {
    pub fn is_selectable(&self) -> bool {
        !self.attributes.contains(MailboxAttribute::NoSelect)
    }

    #[cfg(test)]
    fn child_mut(&mut self, name: &str) -> Option<&mut MailboxNode> {
        self.children.iter_mut().find(|child| child.name == name)
    }
}

/// Folder hierarchy as reported by the server, in reporting order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MailboxTree {
    pub roots: Vec<MailboxNode>,
}

impl MailboxTree {
    /// Folds flat LIST entries into a tree. Levels the server did not list
    /// on their own are added as non-selectable containers.
    pub fn from_list(
        entries: impl IntoIterator<Item = ListEntry>,
    ) -> Result<Self, MailboxNodeBuilderError> {
        let mut tree = Self::default();
        for entry in entries {
            tree.insert(entry)?;
        }
        Ok(tree)
    }

    fn insert(&mut self, entry: ListEntry) -> Result<(), MailboxNodeBuilderError> {
        let segments: Vec<&str> = match entry.delimiter.as_deref() {
            Some(delimiter) if !delimiter.is_empty() => entry.name.split(delimiter).collect(),
            _ => vec![entry.name.as_str()],
        };
        let Some((leaf, parents)) = segments.split_last() else {
            return Ok(());
        };

        let mut level = &mut self.roots;
        for parent in parents {
            let index = if let Some(index) = level.iter().position(|node| node.name == *parent) {
                index
            } else {
                trace!("adding unlisted container {parent} of {}", entry.name);
                let mut container = MailboxNodeBuilder::default();
                container
                    .name(*parent)
                    .attributes(MailboxAttribute::NoSelect.into());
                if let Some(delimiter) = &entry.delimiter {
                    container.delimiter(delimiter.as_str());
                }
                level.push(container.build()?);
                level.len() - 1
            };
            level = &mut level[index].children;
        }

        if let Some(existing) = level.iter_mut().find(|node| node.name == *leaf) {
            existing.attributes = entry.attributes;
            existing.delimiter.clone_from(&entry.delimiter);
        } else {
            let mut node = MailboxNodeBuilder::default();
            node.name(*leaf).attributes(entry.attributes);
            if let Some(delimiter) = entry.delimiter.as_deref() {
                node.delimiter(delimiter);
            }
            level.push(node.build()?);
        }
        Ok(())
    }

    /// Looks up a node by its full path segments.
    #[cfg(test)]
    fn find(&mut self, segments: &[&str]) -> Option<&mut MailboxNode> {
        let (first, rest) = segments.split_first()?;
        let mut node = self.roots.iter_mut().find(|node| node.name == *first)?;
        for segment in rest {
            node = node.child_mut(segment)?;
        }
        Some(node)
    }
}
