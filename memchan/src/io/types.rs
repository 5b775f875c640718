//! Channel capability types

/// A single capability requested when opening a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenMode {
    /// Reads are allowed
    Read,
    /// Positional writes are allowed
    Write,
    /// Writes are allowed and always land at the end of the store
    Append,
}

/// Capability set of a channel, fixed at construction
///
/// `append` implies `write`: an append-only channel is writable, but every
/// write goes to the end of the store.
///
/// # Example
///
/// ```
/// use memchan::io::{OpenMode, OpenOptions};
///
/// let options = OpenOptions::new().read(true).append(true);
/// assert!(options.is_readable());
/// assert!(options.is_writable());
///
/// let same: OpenOptions = [OpenMode::Read, OpenMode::Append].into_iter().collect();
/// assert_eq!(options, same);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenOptions {
    read: bool,
    write: bool,
    append: bool,
}

impl OpenOptions {
    /// Options with no capabilities
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with the given capabilities
    #[must_use]
    pub fn from_modes(modes: &[OpenMode]) -> Self {
        modes.iter().copied().collect()
    }

    #[must_use]
    pub fn read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }

    #[must_use]
    pub fn write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    #[must_use]
    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.read
    }

    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.write || self.append
    }

    #[must_use]
    pub fn is_append(&self) -> bool {
        self.append
    }

    /// Check whether the options contain `mode`
    #[must_use]
    pub fn contains(&self, mode: OpenMode) -> bool {
        match mode {
            OpenMode::Read => self.is_readable(),
            OpenMode::Write => self.is_writable(),
            OpenMode::Append => self.is_append(),
        }
    }
}

impl FromIterator<OpenMode> for OpenOptions {
    fn from_iter<I: IntoIterator<Item = OpenMode>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |options, mode| match mode {
            OpenMode::Read => options.read(true),
            OpenMode::Write => options.write(true),
            OpenMode::Append => options.append(true),
        })
    }
}

/// Mapping mode accepted by `Channel::map`
///
/// Mapping is never supported; the type only exists so the call has the
/// usual shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMode {
    ReadOnly,
    ReadWrite,
    Private,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_capabilities() {
        let options = OpenOptions::new();
        assert!(!options.is_readable());
        assert!(!options.is_writable());
        assert!(!options.is_append());
    }

    #[test]
    fn test_append_implies_write() {
        let options = OpenOptions::from_modes(&[OpenMode::Append]);
        assert!(options.is_writable());
        assert!(options.contains(OpenMode::Write));
        assert!(!options.is_readable());
    }

    #[test]
    fn test_from_modes_matches_builder() {
        assert_eq!(
            OpenOptions::from_modes(&[OpenMode::Read, OpenMode::Write]),
            OpenOptions::new().read(true).write(true)
        );
    }
}
