//! CSI parameter lists
//!
//! Parameters are `;`-separated fields. Empty fields are kept (they read
//! as 0), and each field is converted permissively: leading whitespace,
//! an optional sign, then digits; anything unparseable reads as 0.

/// Parsed parameters of one control sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params<'a> {
    fields: Vec<&'a [u8]>,
}

impl<'a> Params<'a> {
    /// Split raw parameter bytes (everything between `[` and the command
    /// byte). An empty input gives an empty list.
    pub fn parse(raw: &'a [u8]) -> Self {
        if raw.is_empty() {
            return Self { fields: Vec::new() };
        }
        Self {
            fields: raw.split(|&b| b == b';').collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The raw bytes of field `index`
    pub fn raw(&self, index: usize) -> Option<&'a [u8]> {
        self.fields.get(index).copied()
    }

    /// Numeric value of field `index`, `None` when absent
    pub fn get(&self, index: usize) -> Option<i32> {
        self.raw(index).map(atoi)
    }

    /// Numeric value of field `index`, or `default` when absent
    pub fn get_or(&self, index: usize, default: i32) -> i32 {
        self.get(index).unwrap_or(default)
    }

    /// A repeat count: absent, zero or negative all mean 1
    pub fn count(&self, index: usize) -> u16 {
        self.get_or(index, 1).clamp(1, u16::MAX as i32) as u16
    }

    /// All numeric values in order
    pub fn values(&self) -> impl Iterator<Item = i32> + '_ {
        self.fields.iter().map(|f| atoi(f))
    }
}

/// Permissive decimal conversion with C `atoi` semantics, saturating
/// instead of overflowing
pub fn atoi(field: &[u8]) -> i32 {
    let mut bytes = field
        .iter()
        .copied()
        .skip_while(|b| b.is_ascii_whitespace())
        .peekable();

    let negative = match bytes.peek() {
        Some(b'-') => {
            bytes.next();
            true
        }
        Some(b'+') => {
            bytes.next();
            false
        }
        _ => false,
    };

    let mut value: i64 = 0;
    for b in bytes.take_while(u8::is_ascii_digit) {
        value = (value * 10 + (b - b'0') as i64).min(i32::MAX as i64 + 1);
    }
    if negative {
        value = -value;
    }
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atoi() {
        assert_eq!(atoi(b"31"), 31);
        assert_eq!(atoi(b""), 0);
        assert_eq!(atoi(b"abc"), 0);
        assert_eq!(atoi(b"12ab"), 12);
        assert_eq!(atoi(b"  7"), 7);
        assert_eq!(atoi(b"-3"), -3);
        assert_eq!(atoi(b"+4"), 4);
        assert_eq!(atoi(b"?1049"), 0);
        assert_eq!(atoi(b"99999999999"), i32::MAX);
    }

    #[test]
    fn test_parse_keeps_empty_fields() {
        let params = Params::parse(b"1;;31");
        assert_eq!(params.len(), 3);
        assert_eq!(params.values().collect::<Vec<_>>(), vec![1, 0, 31]);
    }

    #[test]
    fn test_empty_input_is_empty_list() {
        let params = Params::parse(b"");
        assert!(params.is_empty());
        assert_eq!(params.get(0), None);
        assert_eq!(params.count(0), 1);
    }

    #[test]
    fn test_count_defaults() {
        let params = Params::parse(b"0;5;-2");
        assert_eq!(params.count(0), 1);
        assert_eq!(params.count(1), 5);
        assert_eq!(params.count(2), 1);
        assert_eq!(params.count(3), 1);
    }

    #[test]
    fn test_raw_field() {
        let params = Params::parse(b"?1049");
        assert_eq!(params.raw(0), Some(&b"?1049"[..]));
    }
}
