//! Bookkeeping of stylesheets that have already been scanned.

use std::collections::HashSet;

use css::NodeKey;

/// Which stylesheets have been scanned. Entries are only ever added.
#[derive(Debug, Default)]
pub struct HandledRegistry {
    /// Linked stylesheets, by `href`.
    stylesheets: HashSet<String>,
    /// Inline `<style>` elements, by node identity, in the order they were scanned.
    style_tags: Vec<NodeKey>,
}

impl HandledRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stylesheet_handled(&self, href: &str) -> bool {
        self.stylesheets.contains(href)
    }

    pub fn mark_stylesheet(&mut self, href: &str) {
        if !self.stylesheets.contains(href) {
            self.stylesheets.insert(href.to_owned());
        }
    }

    pub fn is_style_tag_handled(&self, key: NodeKey) -> bool {
        self.style_tags.contains(&key)
    }

    /// Record a `<style>` element; recording the same element twice keeps one entry.
    pub fn record_style_tag(&mut self, key: NodeKey) {
        if !self.is_style_tag_handled(key) {
            self.style_tags.push(key);
        }
    }

    pub fn handled_style_tags(&self) -> &[NodeKey] {
        &self.style_tags
    }

    pub fn handled_stylesheet_count(&self) -> usize {
        self.stylesheets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_tags_are_recorded_once_in_order() {
        let mut registry = HandledRegistry::new();
        registry.record_style_tag(NodeKey(3));
        registry.record_style_tag(NodeKey(1));
        registry.record_style_tag(NodeKey(3));
        assert_eq!(registry.handled_style_tags(), [NodeKey(3), NodeKey(1)]);
    }

    #[test]
    fn stylesheets_are_keyed_by_href() {
        let mut registry = HandledRegistry::new();
        assert!(!registry.is_stylesheet_handled("https://a.com/site.css"));
        registry.mark_stylesheet("https://a.com/site.css");
        registry.mark_stylesheet("https://a.com/site.css");
        assert!(registry.is_stylesheet_handled("https://a.com/site.css"));
        assert_eq!(registry.handled_stylesheet_count(), 1);
    }
}
