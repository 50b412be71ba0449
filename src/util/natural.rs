use std::cmp::Ordering;

/// 自然序比较：数字串按数值比较（"read2" < "read10"），其余字节按字节值比较。
///
/// 与 samtools 的 `strnum_cmp` 一致，因此与 `samtools sort -n` 的输出顺序相容。
/// 不做大小写折叠，也不依赖 locale。
pub fn natural_cmp(a: &[u8], b: &[u8]) -> Ordering {
    let mut i = 0usize;
    let mut j = 0usize;

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            while i < a.len() && a[i] == b'0' {
                i += 1;
            }
            while j < b.len() && b[j] == b'0' {
                j += 1;
            }
            while digit_at(a, i) && digit_at(b, j) && a[i] == b[j] {
                i += 1;
                j += 1;
            }
            if digit_at(a, i) && digit_at(b, j) {
                // runs differ here; the longer remaining run is the larger number
                let mut k = 0usize;
                while digit_at(a, i + k) && digit_at(b, j + k) {
                    k += 1;
                }
                if digit_at(a, i + k) {
                    return Ordering::Greater;
                }
                if digit_at(b, j + k) {
                    return Ordering::Less;
                }
                return a[i].cmp(&b[j]);
            } else if digit_at(a, i) {
                return Ordering::Greater;
            } else if digit_at(b, j) {
                return Ordering::Less;
            } else if i != j {
                // same value, different zero padding: fewer leading zeros sorts later
                return if i < j { Ordering::Greater } else { Ordering::Less };
            }
        } else {
            if a[i] != b[j] {
                return a[i].cmp(&b[j]);
            }
            i += 1;
            j += 1;
        }
    }

    match (i < a.len(), j < b.len()) {
        (true, _) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => Ordering::Equal,
    }
}

#[inline]
fn digit_at(s: &[u8], i: usize) -> bool {
    s.get(i).map_or(false, u8::is_ascii_digit)
}

/// 检查名称序列在自然序下是否单调不减。
pub fn is_sorted_by_name<I, T>(names: I) -> bool
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut prev: Option<T> = None;
    for name in names {
        if let Some(p) = &prev {
            if natural_cmp(p.as_ref(), name.as_ref()) == Ordering::Greater {
                return false;
            }
        }
        prev = Some(name);
    }
    true
}
