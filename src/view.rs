//! Which pane fills the main area: the editor or a data-file preview.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Editor,
    /// Index into the notebook's data files.
    FilePreview(usize),
}

impl ViewMode {
    /// First data file when there is one, otherwise the editor.
    pub fn initial(data_file_count: usize) -> Self {
        if data_file_count > 0 {
            ViewMode::FilePreview(0)
        } else {
            ViewMode::Editor
        }
    }

    pub fn show_editor(&mut self) {
        *self = ViewMode::Editor;
    }

    /// Switch to file `index`; ignored when it does not exist.
    pub fn show_file(&mut self, index: usize, data_file_count: usize) {
        if index < data_file_count {
            *self = ViewMode::FilePreview(index);
        }
    }

    pub fn is_editor(&self) -> bool {
        matches!(self, ViewMode::Editor)
    }

    /// Tab position: 0 is the editor, data files follow.
    pub fn tab_index(&self) -> usize {
        match self {
            ViewMode::Editor => 0,
            ViewMode::FilePreview(i) => i + 1,
        }
    }

    /// Cycle to the next tab, wrapping around.
    pub fn next_tab(&mut self, data_file_count: usize) {
        *self = match *self {
            ViewMode::Editor if data_file_count > 0 => ViewMode::FilePreview(0),
            ViewMode::FilePreview(i) if i + 1 < data_file_count => ViewMode::FilePreview(i + 1),
            _ => ViewMode::Editor,
        };
    }

    pub fn prev_tab(&mut self, data_file_count: usize) {
        *self = match *self {
            ViewMode::Editor if data_file_count > 0 => ViewMode::FilePreview(data_file_count - 1),
            ViewMode::FilePreview(i) if i > 0 => ViewMode::FilePreview(i - 1),
            _ => ViewMode::Editor,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_mode() {
        assert_eq!(ViewMode::initial(0), ViewMode::Editor);
        assert_eq!(ViewMode::initial(2), ViewMode::FilePreview(0));
    }

    #[test]
    fn test_switching() {
        let mut mode = ViewMode::initial(2);
        mode.show_editor();
        assert!(mode.is_editor());
        mode.show_file(1, 2);
        assert_eq!(mode, ViewMode::FilePreview(1));
        mode.show_file(5, 2);
        assert_eq!(mode, ViewMode::FilePreview(1));
        assert_eq!(mode.tab_index(), 2);
    }

    #[test]
    fn test_tab_cycle() {
        let mut mode = ViewMode::Editor;
        mode.next_tab(2);
        mode.next_tab(2);
        assert_eq!(mode, ViewMode::FilePreview(1));
        mode.next_tab(2);
        assert_eq!(mode, ViewMode::Editor);
        mode.prev_tab(2);
        assert_eq!(mode, ViewMode::FilePreview(1));
        mode.next_tab(0);
        assert_eq!(mode, ViewMode::Editor);
        mode.prev_tab(0);
        assert_eq!(mode, ViewMode::Editor);
    }
}
