//! Hierarchical operation-label allocation: CTEs and directly-nested subqueries under
//! one labeled SELECT get dotted-integer child labels (`<parent>.1`, `<parent>.2`, ...)
//! in source order.

pub(crate) struct ChildLabels<'a> {
    parent: &'a str,
    next: u32,
}

impl<'a> ChildLabels<'a> {
    pub(crate) fn new(parent: &'a str) -> Self {
        Self { parent, next: 1 }
    }

    pub(crate) fn next(&mut self) -> String {
        let label = format!("{}.{}", self.parent, self.next);
        self.next += 1;
        label
    }
}
