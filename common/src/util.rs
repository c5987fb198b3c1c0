/// `1234567` -> `1,234,567`
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Short problem size label, `N=1000k` for `n = 1_000_000`
pub fn size_label(n: u64) -> String {
    format!("N={}k", n / 1000)
}

/// Cycles through `items`, so short palettes never run out
pub fn cycled<T: Copy>(items: &[T], idx: usize) -> T {
    items[idx % items.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(100_000), "100,000");
        assert_eq!(group_thousands(10_000_000), "10,000,000");
    }

    #[test]
    fn size_labels() {
        assert_eq!(size_label(100_000), "N=100k");
        assert_eq!(size_label(500), "N=0k");
    }

    #[test]
    fn palette_wraps() {
        let palette = [1, 2, 3];
        assert_eq!(cycled(&palette, 1), 2);
        assert_eq!(cycled(&palette, 4), 2);
    }
}
