use std::collections::BTreeMap;

use crate::marker::MarkerId;

/// Which images each marker was seen on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GcpRegistry {
    found: BTreeMap<MarkerId, Vec<String>>,
}

impl GcpRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: MarkerId, image_name: &str) {
        self.found
            .entry(id)
            .or_default()
            .push(image_name.to_string());
    }

    pub fn images(&self, id: MarkerId) -> &[String] {
        self.found.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// `(id, images)` in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (MarkerId, &[String])> {
        self.found.iter().map(|(id, names)| (*id, names.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.found.len()
    }

    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }

    /// One summary line per marker: `GCP<id>: on <n> images [..]`.
    pub fn summary_lines(&self) -> Vec<String> {
        self.iter()
            .map(|(id, names)| {
                let list: Vec<String> = names.iter().map(|n| quoted(n)).collect();
                format!("GCP{id}: on {} images [{}]", names.len(), list.join(", "))
            })
            .collect()
    }
}

/// Single-quoted string literal, switching to double quotes when the text
/// holds a single quote but no double quote.
fn quoted(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\");
    if text.contains('\'') && !text.contains('"') {
        format!("\"{escaped}\"")
    } else {
        format!("'{}'", escaped.replace('\'', "\\'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order_and_keeps_repeats() {
        let mut reg = GcpRegistry::new();
        reg.record(4, "b.jpg");
        reg.record(2, "a.jpg");
        reg.record(4, "c.jpg");
        reg.record(4, "c.jpg");

        assert_eq!(reg.len(), 2);
        assert_eq!(reg.images(4), ["b.jpg", "c.jpg", "c.jpg"]);
        assert!(reg.images(99).is_empty());
        let ids: Vec<MarkerId> = reg.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![2, 4]);
    }

    #[test]
    fn summary_format() {
        let mut reg = GcpRegistry::new();
        reg.record(7, "x.jpg");
        reg.record(7, "y.jpg");
        assert_eq!(
            reg.summary_lines(),
            vec!["GCP7: on 2 images ['x.jpg', 'y.jpg']".to_string()]
        );
    }

    #[test]
    fn names_with_quotes() {
        assert_eq!(quoted("plain.jpg"), "'plain.jpg'");
        assert_eq!(quoted("it's.jpg"), "\"it's.jpg\"");
        assert_eq!(quoted(r#"a'b"c.jpg"#), r#"'a\'b"c.jpg'"#);
        assert_eq!(quoted(r"C:\img.jpg"), r"'C:\\img.jpg'");
    }
}
