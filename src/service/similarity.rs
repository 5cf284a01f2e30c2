use crate::models::FieldValue;
use std::collections::HashMap;

/// 两个单元格的模糊相似度 (按文本形式比较)
pub fn fuzzy_score(a: &FieldValue, b: &FieldValue) -> f64 {
    similarity_ratio(&a.as_text(), &b.as_text())
}

/// 相似度 = 2 * 匹配字符数 / 两串总长度, 取值 [0, 1]
///
/// 匹配字符数由最长公共连续块递归求得: 先找最长公共块, 再对左右两侧剩余部分
/// 分别重复。两串都为空时返回 1.0。
///
/// 两个输入先按字典序排列再匹配, 保证 `similarity_ratio(a, b) == similarity_ratio(b, a)`。
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let a: Vec<char> = first.chars().collect();
    let b: Vec<char> = second.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matches = BlockMatcher::new(&a, &b).matching_characters();
    2.0 * matches as f64 / total as f64
}

/// 公共块匹配器
struct BlockMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// b 中每个字符出现的位置 (升序)
    b_index: HashMap<char, Vec<usize>>,
}

impl<'a> BlockMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b_index.entry(c).or_default().push(j);
        }
        Self { a, b, b_index }
    }

    /// 所有匹配块的字符总数
    fn matching_characters(&self) -> usize {
        let mut total = 0;
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            total += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }

        total
    }

    /// a[alo..ahi] 与 b[blo..bhi] 的最长公共块 (i, j, size)
    ///
    /// 同长度时取 a 中最靠前者, 再取 b 中最靠前者。
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
        // j -> 以 a[i-1], b[j] 结尾的公共块长度
        let mut run_len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_run_len = HashMap::new();
            if let Some(positions) = self.b_index.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| run_len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_run_len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            run_len = next_run_len;
        }

        (best_i, best_j, best_size)
    }
}
