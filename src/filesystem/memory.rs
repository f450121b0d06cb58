// src/filesystem/memory.rs

//! In-memory filesystem with arena allocation and O(1) path lookup
//!
//! [`MemFilesystem`] implements [`Filesystem`] without touching real storage,
//! so archive creation can be exercised in tests (including failure paths
//! such as a read-only store or a failing disk) and in dry runs.
//!
//! # Design
//!
//! - **Arena Allocation**: nodes live in a `Vec` and are referenced by
//!   `NodeId` indices. Removed nodes stay in the arena but are unlinked from
//!   their parent and from the path index.
//!
//! - **O(1) Path Lookup**: a `HashMap` maps normalized absolute paths to node
//!   IDs. Relative paths are resolved against `/`.
//!
//! - **Shared Access**: the tree sits behind a `parking_lot::RwLock`, so a
//!   single instance can be shared across builder invocations.

use super::{FileKind, Filesystem};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeId(usize);

#[derive(Debug)]
enum NodeKind {
    Directory,
    File { data: Vec<u8> },
}

#[derive(Debug)]
struct MemNode {
    /// Name of this node (just the filename, not full path)
    name: String,
    kind: NodeKind,
    /// Parent node (None for root)
    parent: Option<NodeId>,
    /// Children node IDs (only populated for directories)
    children: Vec<NodeId>,
}

impl MemNode {
    fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory)
    }

    fn file_kind(&self) -> FileKind {
        match self.kind {
            NodeKind::Directory => FileKind::Directory,
            NodeKind::File { .. } => FileKind::File,
        }
    }
}

#[derive(Debug)]
struct MemTree {
    nodes: Vec<MemNode>,
    path_index: HashMap<PathBuf, NodeId>,
    read_only: bool,
    write_fault: Option<io::ErrorKind>,
}

const ROOT: NodeId = NodeId(0);

impl Default for MemTree {
    fn default() -> Self {
        let mut path_index = HashMap::new();
        path_index.insert(PathBuf::from("/"), ROOT);

        Self {
            nodes: vec![MemNode {
                name: String::new(),
                kind: NodeKind::Directory,
                parent: None,
                children: Vec::new(),
            }],
            path_index,
            read_only: false,
            write_fault: None,
        }
    }
}

fn error(kind: io::ErrorKind, what: &str, path: &Path) -> io::Error {
    io::Error::new(kind, format!("{}: {}", what, path.display()))
}

impl MemTree {
    fn node(&self, id: NodeId) -> &MemNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut MemNode {
        &mut self.nodes[id.0]
    }

    fn lookup(&self, path: &Path) -> Option<NodeId> {
        self.path_index.get(path).copied()
    }

    fn allocate(&mut self, node: MemNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Full path of a node, rebuilt by walking up to the root
    fn get_path(&self, id: NodeId) -> PathBuf {
        let mut components = Vec::new();
        let mut current = id;

        while let Some(parent) = self.node(current).parent {
            components.push(self.node(current).name.as_str());
            current = parent;
        }

        let mut path = PathBuf::from("/");
        for component in components.into_iter().rev() {
            path.push(component);
        }
        path
    }

    fn check_writable(&self, path: &Path) -> io::Result<()> {
        if self.read_only {
            return Err(error(
                io::ErrorKind::PermissionDenied,
                "read-only filesystem",
                path,
            ));
        }
        Ok(())
    }

    /// Resolve the directory that will contain `path`
    fn parent_dir(&self, path: &Path) -> io::Result<NodeId> {
        let parent_path = path
            .parent()
            .ok_or_else(|| error(io::ErrorKind::InvalidInput, "no parent for", path))?;
        let parent_id = self
            .lookup(parent_path)
            .ok_or_else(|| error(io::ErrorKind::NotFound, "parent directory not found", path))?;
        if !self.node(parent_id).is_directory() {
            return Err(error(
                io::ErrorKind::NotADirectory,
                "parent is not a directory",
                path,
            ));
        }
        Ok(parent_id)
    }

    fn file_name(path: &Path) -> io::Result<String> {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| error(io::ErrorKind::InvalidInput, "invalid path", path))
    }

    fn link(&mut self, path: PathBuf, parent: NodeId, kind: NodeKind) -> io::Result<NodeId> {
        let name = Self::file_name(&path)?;
        let id = self.allocate(MemNode {
            name,
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.node_mut(parent).children.push(id);
        self.path_index.insert(path, id);
        Ok(id)
    }

    fn collect_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        for &child in &self.node(id).children {
            self.collect_subtree(child, out);
        }
    }

    /// Unlink a node (and its subtree) from its parent and the path index
    fn detach(&mut self, id: NodeId) {
        let mut subtree = Vec::new();
        self.collect_subtree(id, &mut subtree);
        for &node in &subtree {
            let node_path = self.get_path(node);
            self.path_index.remove(&node_path);
        }
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&c| c != id);
        }
    }

    fn mkdir_p(&mut self, path: &Path) -> io::Result<()> {
        let mut to_create = Vec::new();
        let mut current = path.to_path_buf();
        loop {
            match self.lookup(&current) {
                Some(id) if self.node(id).is_directory() => break,
                Some(_) if current == path => {
                    return Err(error(
                        io::ErrorKind::AlreadyExists,
                        "path exists and is not a directory",
                        path,
                    ));
                }
                Some(_) => {
                    return Err(error(
                        io::ErrorKind::NotADirectory,
                        "ancestor is not a directory",
                        &current,
                    ));
                }
                None => {
                    to_create.push(current.clone());
                    if !current.pop() {
                        break;
                    }
                }
            }
        }

        if to_create.is_empty() {
            return Ok(());
        }
        self.check_writable(path)?;
        for dir in to_create.into_iter().rev() {
            let parent = self.parent_dir(&dir)?;
            self.link(dir, parent, NodeKind::Directory)?;
        }
        Ok(())
    }

    fn write(&mut self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.check_writable(path)?;
        if let Some(kind) = self.write_fault {
            return Err(error(kind, "write failed", path));
        }

        let parent = self.parent_dir(path)?;
        match self.lookup(path) {
            Some(id) => match &mut self.node_mut(id).kind {
                NodeKind::File { data: existing } => {
                    *existing = data.to_vec();
                    Ok(())
                }
                NodeKind::Directory => {
                    Err(error(io::ErrorKind::IsADirectory, "is a directory", path))
                }
            },
            None => {
                self.link(
                    path.to_path_buf(),
                    parent,
                    NodeKind::File {
                        data: data.to_vec(),
                    },
                )?;
                Ok(())
            }
        }
    }

    fn remove_file(&mut self, path: &Path) -> io::Result<()> {
        self.check_writable(path)?;
        let id = self
            .lookup(path)
            .ok_or_else(|| error(io::ErrorKind::NotFound, "no such file", path))?;
        if self.node(id).is_directory() {
            return Err(error(io::ErrorKind::IsADirectory, "is a directory", path));
        }
        self.detach(id);
        Ok(())
    }

    fn remove_dir(&mut self, path: &Path) -> io::Result<()> {
        self.check_writable(path)?;
        let id = self
            .lookup(path)
            .ok_or_else(|| error(io::ErrorKind::NotFound, "no such directory", path))?;
        if id == ROOT {
            return Err(error(io::ErrorKind::PermissionDenied, "cannot remove root", path));
        }
        let node = self.node(id);
        if !node.is_directory() {
            return Err(error(io::ErrorKind::NotADirectory, "not a directory", path));
        }
        if !node.children.is_empty() {
            return Err(error(
                io::ErrorKind::DirectoryNotEmpty,
                "directory not empty",
                path,
            ));
        }
        self.detach(id);
        Ok(())
    }

    fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        self.check_writable(from)?;
        let source = self
            .lookup(from)
            .ok_or_else(|| error(io::ErrorKind::NotFound, "no such file or directory", from))?;
        if source == ROOT {
            return Err(error(io::ErrorKind::PermissionDenied, "cannot rename root", from));
        }
        if from == to {
            return Ok(());
        }
        if to.starts_with(from) {
            return Err(error(
                io::ErrorKind::InvalidInput,
                "cannot move a directory into itself",
                to,
            ));
        }
        let new_parent = self.parent_dir(to)?;
        let source_is_dir = self.node(source).is_directory();

        if let Some(target) = self.lookup(to) {
            let target_is_dir = self.node(target).is_directory();
            let target_is_empty = self.node(target).children.is_empty();
            match (source_is_dir, target_is_dir) {
                (false, true) => {
                    return Err(error(io::ErrorKind::IsADirectory, "is a directory", to));
                }
                (true, false) => {
                    return Err(error(io::ErrorKind::NotADirectory, "not a directory", to));
                }
                (true, true) if !target_is_empty => {
                    return Err(error(
                        io::ErrorKind::DirectoryNotEmpty,
                        "directory not empty",
                        to,
                    ));
                }
                _ => self.detach(target),
            }
        }

        let name = Self::file_name(to)?;
        self.detach(source);
        let node = self.node_mut(source);
        node.name = name;
        node.parent = Some(new_parent);
        self.node_mut(new_parent).children.push(source);

        let mut subtree = Vec::new();
        self.collect_subtree(source, &mut subtree);
        for id in subtree {
            let path = self.get_path(id);
            self.path_index.insert(path, id);
        }
        Ok(())
    }
}

/// Resolve `path` lexically into an absolute path rooted at `/`
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    normalized
}

/// In-memory [`Filesystem`]
///
/// # Example
///
/// ```
/// use component_archive::filesystem::{Filesystem, MemFilesystem};
/// use std::path::Path;
///
/// let fs = MemFilesystem::new();
/// fs.create_dir_all(Path::new("/work/archive")).unwrap();
/// fs.write_file(Path::new("/work/archive/data"), b"abc").unwrap();
/// assert_eq!(fs.read_file(Path::new("/work/archive/data")).unwrap(), b"abc");
/// ```
#[derive(Debug, Default)]
pub struct MemFilesystem {
    tree: RwLock<MemTree>,
}

impl MemFilesystem {
    /// Create an empty filesystem containing only `/`
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every mutation with `PermissionDenied`
    pub fn set_read_only(&self, read_only: bool) {
        self.tree.write().read_only = read_only;
    }

    /// Make `write_file` fail with the given error kind
    ///
    /// Directory operations keep working, which simulates a store that
    /// fails halfway through an operation (for example a full disk).
    pub fn set_write_fault(&self, kind: Option<io::ErrorKind>) {
        self.tree.write().write_fault = kind;
    }

    /// Every live path mapped to its content (`None` for directories)
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
        let tree = self.tree.read();
        tree.path_index
            .iter()
            .map(|(path, &id)| {
                let content = match &tree.node(id).kind {
                    NodeKind::Directory => None,
                    NodeKind::File { data } => Some(data.clone()),
                };
                (path.clone(), content)
            })
            .collect()
    }

    /// Number of live entries, including the root directory
    pub fn len(&self) -> usize {
        self.tree.read().path_index.len()
    }

    /// True when only the root directory exists
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }
}

impl Filesystem for MemFilesystem {
    fn stat(&self, path: &Path) -> io::Result<Option<FileKind>> {
        let tree = self.tree.read();
        Ok(tree
            .lookup(&normalize_path(path))
            .map(|id| tree.node(id).file_kind()))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.tree.write().mkdir_p(&normalize_path(path))
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.tree.write().write(&normalize_path(path), data)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        let path = normalize_path(path);
        let tree = self.tree.read();
        let id = tree
            .lookup(&path)
            .ok_or_else(|| error(io::ErrorKind::NotFound, "no such file", &path))?;
        match &tree.node(id).kind {
            NodeKind::File { data } => Ok(data.clone()),
            NodeKind::Directory => Err(error(io::ErrorKind::IsADirectory, "is a directory", &path)),
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let path = normalize_path(path);
        let tree = self.tree.read();
        let id = tree
            .lookup(&path)
            .ok_or_else(|| error(io::ErrorKind::NotFound, "no such directory", &path))?;
        let node = tree.node(id);
        if !node.is_directory() {
            return Err(error(io::ErrorKind::NotADirectory, "not a directory", &path));
        }
        let mut names: Vec<String> = node
            .children
            .iter()
            .map(|&child| tree.node(child).name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.tree
            .write()
            .rename(&normalize_path(from), &normalize_path(to))
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.tree.write().remove_file(&normalize_path(path))
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        self.tree.write().remove_dir(&normalize_path(path))
    }
}
