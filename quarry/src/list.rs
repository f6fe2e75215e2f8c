/// An ordered sequence shaped by composers.
///
/// Each composer receives the whole current sequence and replaces it, so a
/// composer may filter, reorder, enrich or change the element type. Composers
/// apply in the order they are added.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionList<T> {
    items: Vec<T>,
    composers: usize,
}

impl<T> CollectionList<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        CollectionList {
            items: items.into_iter().collect(),
            composers: 0,
        }
    }

    pub fn compose<U, F>(self, composer: F) -> CollectionList<U>
    where
        F: FnOnce(Vec<T>) -> Vec<U>,
    {
        CollectionList {
            items: composer(self.items),
            composers: self.composers + 1,
        }
    }

    /// Number of composers applied so far.
    pub fn composers_applied(&self) -> usize {
        self.composers
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn build(self) -> Vec<T> {
        self.items
    }
}

impl<T> FromIterator<T> for CollectionList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        CollectionList::new(iter)
    }
}

impl<T> IntoIterator for CollectionList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn upper(items: Vec<&str>) -> Vec<String> {
        items.into_iter().map(str::to_uppercase).collect()
    }

    fn drop_y(items: Vec<String>) -> Vec<String> {
        items.into_iter().filter(|s| s != "Y").collect()
    }

    #[test]
    fn test_upper_then_filter() {
        let list = CollectionList::new(["x", "y"]).compose(upper).compose(drop_y);
        assert_eq!(list.composers_applied(), 2);
        assert_eq!(list.build(), vec!["X".to_string()]);
    }

    #[test]
    fn test_chain_equals_function_composition() {
        let chained = CollectionList::new(["a", "y", "b"]).compose(upper).compose(drop_y).build();
        let composed = drop_y(upper(vec!["a", "y", "b"]));
        assert_eq!(chained, composed);
    }

    #[test]
    fn test_composer_may_change_element_type() {
        let lengths = CollectionList::new(vec!["ab", "cde"])
            .compose(|items| items.into_iter().map(str::len).collect());
        assert_eq!(lengths.iter().sum::<usize>(), 5);
    }

    #[test]
    fn test_empty_list_without_composers() {
        let list: CollectionList<u8> = CollectionList::new(Vec::new());
        assert!(list.is_empty());
        assert_eq!(list.composers_applied(), 0);
    }
}
