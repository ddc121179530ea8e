use crate::page::PageContext;

/// Where the user's current text selection comes from. The host environment implements this.
pub trait SelectionSource: Send + Sync {
    fn selection(&self) -> Option<String>;
}

impl SelectionSource for Option<String> {
    fn selection(&self) -> Option<String> {
        self.clone()
    }
}

impl SelectionSource for PageContext {
    fn selection(&self) -> Option<String> {
        self.selection.clone()
    }
}

/// The current selection, or `""` when nothing is selected.
pub fn extract_selection<S: SelectionSource + ?Sized>(source: &S) -> String {
    source.selection().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_selection_is_empty_string() {
        assert_eq!(extract_selection(&PageContext::default()), "");
        assert_eq!(extract_selection(&None::<String>), "");
    }

    #[test]
    fn selection_is_returned_verbatim() {
        let page = PageContext::for_selection("  Photosynthesis converts light.\n");
        assert_eq!(extract_selection(&page), "  Photosynthesis converts light.\n");
    }

    #[test]
    fn works_through_trait_objects() {
        let source: Box<dyn SelectionSource> = Box::new(Some("picked".to_string()));
        assert_eq!(extract_selection(source.as_ref()), "picked");
    }
}
