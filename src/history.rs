//! Browser-history abstraction.
//!
//! The orchestrator reads its state from the current location and pushes a
//! new entry whenever user interaction changes it. Hosts bridge this trait to
//! the real `window.history`; [`MemoryHistory`] backs the CLI and tests.

/// Path and search string of the current location.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub path: String,
    /// Query string including the leading `?`, or empty.
    pub search: String,
}

impl Location {
    /// Split a URL (or path) at its first `?`. Fragments are dropped.
    pub fn parse(url: &str) -> Self {
        let url = url.split('#').next().unwrap_or_default();
        match url.find('?') {
            Some(idx) => Self {
                path: url[..idx].to_string(),
                search: url[idx..].to_string(),
            },
            None => Self {
                path: url.to_string(),
                search: String::new(),
            },
        }
    }

    pub fn href(&self) -> String {
        format!("{}{}", self.path, self.search)
    }
}

pub trait UrlHistory: Send {
    fn location(&self) -> Location;

    /// Push a new entry and make it current.
    fn push_state(&mut self, url: &str);
}

/// In-memory history stack with back/forward navigation.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<Location>,
    index: usize,
}

impl MemoryHistory {
    pub fn new(initial_url: &str) -> Self {
        Self {
            entries: vec![Location::parse(initial_url)],
            index: 0,
        }
    }

    /// Step back one entry. Returns false at the start of history.
    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Step forward one entry. Returns false at the end of history.
    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Location] {
        &self.entries
    }
}

impl UrlHistory for MemoryHistory {
    fn location(&self) -> Location {
        self.entries.get(self.index).cloned().unwrap_or_default()
    }

    fn push_state(&mut self, url: &str) {
        let mut location = Location::parse(url);
        // relative pushes keep the current path, like the browser
        if location.path.is_empty() {
            location.path = self.location().path;
        }
        self.entries.truncate(self.index + 1);
        self.entries.push(location);
        self.index = self.entries.len() - 1;
    }
}
