//! 퍼지 컬럼 매칭
//!
//! Ratcliff/Obershelp 방식의 문자열 유사도입니다.
//! 가장 긴 공통 블록을 찾고 좌우 나머지 구간에서 재귀적으로 반복하여
//! `ratio = 2 * M / T` (M: 일치 문자 수, T: 두 문자열 길이 합)를 계산합니다.

use std::collections::HashMap;

/// 컬럼으로 인정하는 최소 유사도
pub const MATCH_CUTOFF: f64 = 0.5;

/// 이 길이 이상의 두 번째 시퀀스에서는 흔한 문자를 앵커에서 제외
const AUTOJUNK_MIN_LEN: usize = 200;

struct SequenceMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// b의 문자 → 등장 위치 (오름차순)
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> SequenceMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, ch) in b.iter().enumerate() {
            b2j.entry(*ch).or_default().push(j);
        }

        if b.len() >= AUTOJUNK_MIN_LEN {
            let threshold = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= threshold);
        }

        Self { a, b, b2j }
    }

    /// a[alo..ahi], b[blo..bhi] 구간의 가장 긴 일치 블록 (i, j, size)
    ///
    /// 길이가 같으면 a에서 가장 먼저 시작하는 블록, 그 중에서도 b에서 가장 먼저
    /// 시작하는 블록을 고릅니다.
    fn find_longest_match(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_j2len = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = next_j2len;
        }

        // autojunk로 빠진 문자도 블록 양 끝에서는 이어 붙임
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && self.a[best_i + best_size] == self.b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }

    /// 모든 일치 블록의 문자 수 합
    fn matching_chars(&self) -> usize {
        let mut total = 0;
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.find_longest_match(alo, ahi, blo, bhi);
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
}

/// 두 문자열의 유사도 (0.0 ~ 1.0, 둘 다 비어 있으면 1.0)
///
/// 인자 순서에 따라 결과가 달라질 수 있습니다.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matches = SequenceMatcher::new(&a, &b).matching_chars();
    2.0 * matches as f64 / total as f64
}

/// `word`와 가장 비슷한 컬럼 (유사도 0.5 이상)
///
/// 비교는 소문자 컬럼 이름으로 하고, 반환값은 원래 대소문자를 유지합니다.
/// 점수가 같으면 소문자 이름이 사전순으로 큰 쪽을 고릅니다.
pub fn closest_column<'a>(word: &str, columns: &'a [String]) -> Option<&'a str> {
    let mut best: Option<(f64, String, &'a str)> = None;

    for column in columns {
        let lowered = column.to_lowercase();
        let score = similarity(&lowered, word);
        if score < MATCH_CUTOFF {
            continue;
        }

        let better = match &best {
            None => true,
            Some((best_score, best_lowered, _)) => {
                score > *best_score || (score == *best_score && lowered > *best_lowered)
            }
        };
        if better {
            best = Some((score, lowered, column.as_str()));
        }
    }

    best.map(|(_, _, column)| column)
}
