//! Column combinations.

/// All `k`-element subsets of `0..n`, in lexicographic order.
///
/// # Examples
///
/// ```
/// use casegen::utils::combinations;
///
/// let pairs: Vec<Vec<usize>> = combinations(4, 2).collect();
/// assert_eq!(pairs.len(), 6);
/// assert_eq!(pairs[0], vec![0, 1]);
/// assert_eq!(pairs[5], vec![2, 3]);
/// ```
pub fn combinations(n: usize, k: usize) -> impl Iterator<Item = Vec<usize>> {
    Combinations {
        n,
        next: (k <= n).then(|| (0..k).collect()),
    }
}

struct Combinations {
    n: usize,
    next: Option<Vec<usize>>,
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;
        let k = current.len();

        // Rightmost position that can still move right.
        let pivot = (0..k).rev().find(|&i| current[i] < self.n - k + i);
        if let Some(i) = pivot {
            let mut successor = current.clone();
            successor[i] += 1;
            for j in i + 1..k {
                successor[j] = successor[j - 1] + 1;
            }
            self.next = Some(successor);
        }
        Some(current)
    }
}
