use serde::Serialize;

use crate::layout::EftField;

/// First line of an EFT file. Never parsed; echoed verbatim on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderLine(String);

impl HeaderLine {
    pub fn new(line: impl Into<String>) -> Self {
        HeaderLine(line.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One tokenized record line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EftRecord {
    /// One-based line number in the source file.
    pub line: usize,
    pub fields: Vec<String>,
}

impl EftRecord {
    pub fn new(line: usize, fields: Vec<String>) -> Self {
        Self { line, fields }
    }

    pub fn field(&self, position: usize) -> Option<&str> {
        self.fields.get(position).map(String::as_str)
    }

    pub fn get(&self, field: EftField) -> Option<&str> {
        self.field(field.position())
    }

    /// Raw customer code as it appears in the file.
    pub fn customer_code(&self) -> &str {
        self.get(EftField::CustomerCode).unwrap_or_default()
    }
}

/// A loaded EFT file: header plus records normalized to one column count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EftTable {
    pub header: HeaderLine,
    pub columns: Vec<String>,
    pub records: Vec<EftRecord>,
}

impl EftTable {
    /// Number of columns every record carries.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::column_label;

    fn table(width: usize) -> EftTable {
        EftTable {
            header: HeaderLine::new("HDR"),
            columns: (0..width).map(column_label).collect(),
            records: vec![EftRecord::new(2, vec!["0000012".into(); width])],
        }
    }

    #[test]
    fn table_width_follows_columns() {
        let t = table(6);
        assert_eq!(t.width(), 6);
        assert_eq!(t.len(), 1);
        assert!(!t.is_empty());
    }

    #[test]
    fn record_accessors() {
        let r = EftRecord::new(2, vec!["0000012".into(), "A".into()]);
        assert_eq!(r.customer_code(), "0000012");
        assert_eq!(r.get(EftField::Field2), Some("A"));
        assert_eq!(r.get(EftField::Flag), None);
        assert_eq!(EftRecord::new(3, vec![]).customer_code(), "");
    }
}
