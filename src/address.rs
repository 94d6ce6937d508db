use std::cmp::Ordering;
use std::fmt;

/// Highest column index a worksheet can address (`XFD`).
pub const MAX_COLUMN: u32 = 16_384;
/// Highest row index a worksheet can address.
pub const MAX_ROW: u32 = 1_048_576;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct CellAddress {
    pub col: u32,
    pub row: u32,
}

impl CellAddress {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let cleaned: String = s.trim().chars().filter(|c| *c != '$').collect();
        // Split into letters and numbers
        let split_idx = cleaned.find(|c: char| c.is_ascii_digit())?;
        let (col_str, row_str) = cleaned.split_at(split_idx);

        let row = row_str.parse::<u32>().ok()?;
        if row == 0 || row > MAX_ROW {
            return None;
        }
        let col = column_index(col_str)?;

        Some(Self { col, row })
    }

    pub fn with_row(self, row: u32) -> Self {
        Self { row, ..self }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.col, self.row)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

impl Ord for CellAddress {
    fn cmp(&self, other: &Self) -> Ordering {
        // Row-major ordering
        match self.row.cmp(&other.row) {
            Ordering::Equal => self.col.cmp(&other.col),
            ord => ord,
        }
    }
}

impl PartialOrd for CellAddress {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 1-based column index for a letter run like `G` or `AA`.
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        col = col
            .checked_mul(26)?
            .checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)?;
    }
    if col > MAX_COLUMN { None } else { Some(col) }
}

pub fn column_letters(mut col: u32) -> String {
    let mut out = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        out.push((b'A' + rem as u8) as char);
        col = (col - 1) / 26;
    }
    out.iter().rev().collect()
}

/// Inclusive rectangle of cells, as used by merge regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRect {
    pub min_col: u32,
    pub min_row: u32,
    pub max_col: u32,
    pub max_row: u32,
}

impl CellRect {
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        Self {
            min_col: a.col.min(b.col),
            min_row: a.row.min(b.row),
            max_col: a.col.max(b.col),
            max_row: a.row.max(b.row),
        }
    }

    pub fn parse(range: &str) -> Option<Self> {
        let range = range.trim();
        let range = range.rsplit_once('!').map(|(_, r)| r).unwrap_or(range);
        match range.split_once(':') {
            Some((start, end)) => Some(Self::new(
                CellAddress::parse(start)?,
                CellAddress::parse(end)?,
            )),
            None => {
                let single = CellAddress::parse(range)?;
                Some(Self::new(single, single))
            }
        }
    }

    pub fn anchor(&self) -> CellAddress {
        CellAddress::new(self.min_col, self.min_row)
    }

    pub fn contains(&self, addr: CellAddress) -> bool {
        (self.min_col..=self.max_col).contains(&addr.col)
            && (self.min_row..=self.max_row).contains(&addr.row)
    }

    pub fn overlaps(&self, other: &CellRect) -> bool {
        self.min_col <= other.max_col
            && other.min_col <= self.max_col
            && self.min_row <= other.max_row
            && other.min_row <= self.max_row
    }

    pub fn shift_rows(self, delta: u32) -> Self {
        Self {
            min_row: self.min_row + delta,
            max_row: self.max_row + delta,
            ..self
        }
    }

    pub fn extend_rows(self, delta: u32) -> Self {
        Self {
            max_row: self.max_row + delta,
            ..self
        }
    }
}

impl fmt::Display for CellRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            CellAddress::new(self.min_col, self.min_row),
            CellAddress::new(self.max_col, self.max_row)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        let a1 = CellAddress::parse("A1").unwrap();
        let b1 = CellAddress::parse("B1").unwrap();
        let a2 = CellAddress::parse("A2").unwrap();
        let aa1 = CellAddress::parse("AA1").unwrap();

        assert!(a1 < b1);
        assert!(b1 < aa1); // B=2, AA=27
        assert!(aa1 < a2); // Row 1 < Row 2
    }

    #[test]
    fn parses_absolute_and_rejects_garbage() {
        assert_eq!(CellAddress::parse("$G$38"), Some(CellAddress::new(7, 38)));
        assert_eq!(CellAddress::parse("G0"), None);
        assert_eq!(CellAddress::parse("38"), None);
        assert_eq!(CellAddress::parse("G"), None);
        assert_eq!(CellAddress::parse("ZZZZ1"), None);
    }

    #[test]
    fn column_letters_match_index() {
        for (letters, index) in [("A", 1), ("Z", 26), ("AA", 27), ("AZ", 52), ("XFD", 16_384)] {
            assert_eq!(column_index(letters), Some(index));
            assert_eq!(column_letters(index), letters);
        }
    }

    #[test]
    fn rect_parse_normalizes_corners() {
        let rect = CellRect::parse("C4:A2").unwrap();
        assert_eq!(rect.to_string(), "A2:C4");
        assert!(rect.contains(CellAddress::new(2, 3)));
        assert!(!rect.contains(CellAddress::new(4, 3)));
        assert_eq!(CellRect::parse("Sheet1!B2").unwrap().to_string(), "B2:B2");
    }
}
