//! Small dense linear algebra for the solid-phase sub-systems.

use nalgebra::DMatrix;

/// Pivots smaller than this mark the matrix as singular.
pub const SINGULAR_PIVOT: f64 = 1.0e-10;

/// Inverse by Gauss–Jordan elimination with full pivoting.
///
/// Returns `None` when the largest remaining pivot falls below
/// [`SINGULAR_PIVOT`] or the matrix is not square.
pub fn invert_full_pivot(m: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }
    let mut a = m.clone();
    let mut used = vec![false; n];
    let mut row_of = vec![0usize; n];
    let mut col_of = vec![0usize; n];

    for step in 0..n {
        let mut big = 0.0;
        let (mut prow, mut pcol) = (0, 0);
        for (j, used_j) in used.iter().enumerate() {
            if *used_j {
                continue;
            }
            for (k, used_k) in used.iter().enumerate() {
                if *used_k {
                    continue;
                }
                let v = a[(j, k)].abs();
                if v > big {
                    big = v;
                    prow = j;
                    pcol = k;
                }
            }
        }
        if !(big >= SINGULAR_PIVOT) {
            return None;
        }
        used[pcol] = true;
        if prow != pcol {
            a.swap_rows(prow, pcol);
        }
        row_of[step] = prow;
        col_of[step] = pcol;

        let inv_pivot = 1.0 / a[(pcol, pcol)];
        a[(pcol, pcol)] = 1.0;
        for k in 0..n {
            a[(pcol, k)] *= inv_pivot;
        }
        for r in 0..n {
            if r == pcol {
                continue;
            }
            let factor = a[(r, pcol)];
            if factor == 0.0 {
                continue;
            }
            a[(r, pcol)] = 0.0;
            for k in 0..n {
                let v = a[(pcol, k)];
                a[(r, k)] -= v * factor;
            }
        }
    }

    // Undo the column interchanges in reverse order.
    for step in (0..n).rev() {
        if row_of[step] != col_of[step] {
            a.swap_columns(row_of[step], col_of[step]);
        }
    }
    Some(a)
}

/// Advance `idx` to the next `idx.len()`-combination of `0..n` in
/// lexicographic order. Returns `false` after the last one.
pub fn advance_combination(idx: &mut [usize], n: usize) -> bool {
    let k = idx.len();
    if k == 0 || k > n {
        return false;
    }
    let mut i = k;
    while i > 0 {
        i -= 1;
        if idx[i] < n - k + i {
            idx[i] += 1;
            for j in i + 1..k {
                idx[j] = idx[j - 1] + 1;
            }
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_of_permuted_matrix() {
        let m = DMatrix::from_row_slice(3, 3, &[0.0, 2.0, 1.0, 1.0, 0.0, 0.0, 3.0, 1.0, 4.0]);
        let inv = invert_full_pivot(&m).unwrap();
        let id = &m * &inv;
        for r in 0..3 {
            for c in 0..3 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert!((id[(r, c)] - expected).abs() < 1e-12, "{id}");
            }
        }
    }

    #[test]
    fn singular_is_detected() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        assert!(invert_full_pivot(&m).is_none());
        let z = DMatrix::<f64>::zeros(1, 1);
        assert!(invert_full_pivot(&z).is_none());
    }

    #[test]
    fn empty_matrix_inverts() {
        let m = DMatrix::<f64>::zeros(0, 0);
        assert_eq!(invert_full_pivot(&m).unwrap().nrows(), 0);
    }

    #[test]
    fn combinations_in_order() {
        let mut idx = vec![0, 1];
        let mut seen = vec![idx.clone()];
        while advance_combination(&mut idx, 4) {
            seen.push(idx.clone());
        }
        assert_eq!(
            seen,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
    }
}
