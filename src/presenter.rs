// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Result set and the interfaces that render it.

use tracing::debug;

use crate::permissions::ConsentRequest;

/// Renders the discovery result list.
pub trait Presenter {
    /// Replace everything shown with `items`.
    fn refresh(&mut self, items: &[String]);

    /// A single entry was appended at `index`.
    fn inserted(&mut self, index: usize, item: &str);
}

/// How long a notice stays on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLength {
    Short,
    Long,
}

/// Transient user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub length: NoticeLength,
}

impl Notice {
    pub fn short(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            length: NoticeLength::Short,
        }
    }

    pub fn long(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            length: NoticeLength::Long,
        }
    }
}

/// Shows notices and consent prompts.
pub trait Notifier {
    fn notice(&mut self, notice: Notice);

    fn prompt(&mut self, request: ConsentRequest);
}

/// Insertion-ordered, duplicate-free list of display strings.
///
/// Every mutation is forwarded to the presenter.
pub struct ResultSet<P> {
    entries: Vec<String>,
    presenter: P,
}

impl<P: Presenter> ResultSet<P> {
    pub fn new(presenter: P) -> Self {
        Self {
            entries: Vec::new(),
            presenter,
        }
    }

    /// Drop every entry and redraw the list empty.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.presenter.refresh(&self.entries);
    }

    /// Append `entry` unless the exact same string is already present.
    ///
    /// Returns whether it was added.
    pub fn append_unique(&mut self, entry: String) -> bool {
        // Linear scan: result sets stay small.
        if self.entries.iter().any(|e| *e == entry) {
            debug!("Ignoring duplicate entry: {}", entry);
            return false;
        }

        self.entries.push(entry);
        let index = self.entries.len() - 1;
        self.presenter.inserted(index, &self.entries[index]);
        true
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Presenter that mirrors the list the way a widget would.
    #[derive(Default)]
    struct MirrorPresenter {
        rows: Vec<String>,
        refreshes: usize,
        inserts: usize,
    }

    impl Presenter for MirrorPresenter {
        fn refresh(&mut self, items: &[String]) {
            self.rows = items.to_vec();
            self.refreshes += 1;
        }

        fn inserted(&mut self, index: usize, item: &str) {
            self.rows.insert(index, item.to_string());
            self.inserts += 1;
        }
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let mut set = ResultSet::new(MirrorPresenter::default());
        assert!(set.append_unique("B (02)".to_string()));
        assert!(set.append_unique("A (01)".to_string()));

        assert_eq!(set.entries(), ["B (02)", "A (01)"]);
        assert_eq!(set.presenter().rows, set.entries());
    }

    #[test]
    fn test_duplicate_is_not_presented() {
        let mut set = ResultSet::new(MirrorPresenter::default());
        assert!(set.append_unique("Pixel (AA:BB)".to_string()));
        assert!(!set.append_unique("Pixel (AA:BB)".to_string()));

        assert_eq!(set.len(), 1);
        assert_eq!(set.presenter().inserts, 1);
    }

    #[test]
    fn test_same_address_different_name_is_distinct() {
        let mut set = ResultSet::new(MirrorPresenter::default());
        assert!(set.append_unique("Unknown (AA:BB)".to_string()));
        assert!(set.append_unique("Pixel (AA:BB)".to_string()));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_clear_presents_empty_list() {
        let mut set = ResultSet::new(MirrorPresenter::default());
        set.append_unique("Pixel (AA:BB)".to_string());
        set.clear();

        assert!(set.is_empty());
        assert!(set.presenter().rows.is_empty());
        assert_eq!(set.presenter().refreshes, 1);
    }
}
