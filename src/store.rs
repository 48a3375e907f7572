/// In-memory group list, categories and the views derived from them

use crate::config::KeeperConfig;
use crate::tab_data::{TabGroup, TabRef};

/// Ordered category names; the first one is the fixed default
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySet {
    names: Vec<String>,
}

impl CategorySet {
    pub fn new(default: &str) -> Self {
        CategorySet {
            names: vec![default.to_string()],
        }
    }

    /// Default first, then the user's categories with duplicates dropped
    pub fn with_custom(default: &str, custom: &[String]) -> Self {
        let mut set = Self::new(default);
        for name in custom {
            set.add(name);
        }
        set
    }

    /// Rebuild from a full list such as a backup's `categories`
    ///
    /// Any position of the default name is folded into the first slot.
    pub fn from_full(default: &str, names: &[String]) -> Self {
        Self::with_custom(default, names)
    }

    pub fn all(&self) -> &[String] {
        &self.names
    }

    /// Everything except the default, as stored under `customCategories`
    pub fn custom(&self) -> &[String] {
        &self.names[1..]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Appends a trimmed, non-empty, new name; returns whether it was added
    pub fn add(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    fn admits(&self, group: &TabGroup) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => &group.category == name,
        }
    }
}

/// What the user is currently looking at
#[derive(Debug, Clone, PartialEq)]
pub struct ViewQuery {
    pub search: String,
    pub category: CategoryFilter,
    /// 1-based
    pub page: usize,
}

impl Default for ViewQuery {
    fn default() -> Self {
        ViewQuery {
            search: String::new(),
            category: CategoryFilter::All,
            page: 1,
        }
    }
}

impl ViewQuery {
    pub fn with_search(&self, search: String) -> Self {
        ViewQuery {
            search,
            category: self.category.clone(),
            page: 1,
        }
    }

    pub fn with_category(&self, category: CategoryFilter) -> Self {
        ViewQuery {
            search: self.search.clone(),
            category,
            page: 1,
        }
    }

    pub fn with_page(&self, page: usize) -> Self {
        ViewQuery {
            page,
            ..self.clone()
        }
    }
}

/// One page of matching groups
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub groups: Vec<TabGroup>,
    pub page: usize,
    pub total_pages: usize,
    pub matching: usize,
}

impl PageView {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupStore {
    groups: Vec<TabGroup>,
    categories: CategorySet,
}

impl GroupStore {
    pub fn new(groups: Vec<TabGroup>, categories: CategorySet) -> Self {
        GroupStore { groups, categories }
    }

    pub fn empty(config: &KeeperConfig) -> Self {
        Self::new(Vec::new(), CategorySet::new(&config.default_category))
    }

    pub fn groups(&self) -> &[TabGroup] {
        &self.groups
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    pub fn group(&self, group_id: &str) -> Option<&TabGroup> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn total_tabs(&self) -> usize {
        self.groups.iter().map(|g| g.tabs.len()).sum()
    }

    pub fn replace_groups(&mut self, groups: Vec<TabGroup>) {
        self.groups = groups;
    }

    pub fn replace_categories(&mut self, categories: CategorySet) {
        self.categories = categories;
    }

    /// Removes one tab, and the group with it once it is empty
    pub fn delete_tab(&mut self, group_id: &str, tab_index: usize) -> Option<TabRef> {
        let position = self.groups.iter().position(|g| g.id == group_id)?;
        let group = &mut self.groups[position];
        if tab_index >= group.tabs.len() {
            return None;
        }

        let removed = group.tabs.remove(tab_index);
        if group.tabs.is_empty() {
            self.groups.remove(position);
        }
        Some(removed)
    }

    pub fn delete_group(&mut self, group_id: &str) -> bool {
        let original_len = self.groups.len();
        self.groups.retain(|g| g.id != group_id);
        self.groups.len() < original_len
    }

    pub fn rename(&mut self, group_id: &str, title: String) -> bool {
        self.groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .map(|group| {
                group.title = title;
            })
            .is_some()
    }

    /// Not checked against the category set
    pub fn recategorize(&mut self, group_id: &str, category: String) -> bool {
        self.groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .map(|group| {
                group.category = category;
            })
            .is_some()
    }

    pub fn add_category(&mut self, name: &str) -> bool {
        self.categories.add(name)
    }

    pub fn matching(&self, query: &ViewQuery) -> Vec<&TabGroup> {
        let search = query.search.trim();
        self.groups
            .iter()
            .filter(|g| search.is_empty() || g.matches(search))
            .filter(|g| query.category.admits(g))
            .collect()
    }

    pub fn page(&self, query: &ViewQuery, page_size: usize) -> PageView {
        let matching = self.matching(query);
        let page_size = page_size.max(1);
        let total_pages = matching.len().div_ceil(page_size);
        let page = query.page.clamp(1, total_pages.max(1));

        PageView {
            groups: matching
                .iter()
                .skip((page - 1) * page_size)
                .take(page_size)
                .map(|g| (*g).clone())
                .collect(),
            page,
            total_pages,
            matching: matching.len(),
        }
    }
}
