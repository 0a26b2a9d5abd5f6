//! Gaussian smoothing of row-major grids.
//!
//! The filter is applied separably (rows, then columns) with a kernel
//! truncated at four standard deviations. Edges use reflect boundary
//! handling (`d c b a | a b c d | d c b a`).

/// Kernel is truncated at this many standard deviations.
const TRUNCATE_SIGMAS: f64 = 4.0;

/// Smooth a row-major grid with a Gaussian kernel of standard deviation `sigma`.
///
/// Returns the input unchanged when `sigma` is zero, negative or not finite.
///
/// # Arguments
/// * `data` - Grid values in row-major order, no NaNs expected
/// * `ncol` - Number of columns
/// * `nrow` - Number of rows
/// * `sigma` - Standard deviation in cells
pub fn gaussian_smooth(data: &[f64], ncol: usize, nrow: usize, sigma: f64) -> Vec<f64> {
    if !(sigma.is_finite() && sigma > 0.0) || ncol == 0 || nrow == 0 {
        return data.to_vec();
    }

    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;

    // Pass 1: along rows
    let mut horizontal = vec![0.0; data.len()];
    for row in 0..nrow {
        let line = &data[row * ncol..(row + 1) * ncol];
        for col in 0..ncol {
            let mut acc = 0.0;
            for (k, w) in kernel.iter().enumerate() {
                let src = reflect(col as isize + k as isize - radius, ncol);
                acc += w * line[src];
            }
            horizontal[row * ncol + col] = acc;
        }
    }

    // Pass 2: along columns
    let mut output = vec![0.0; data.len()];
    for col in 0..ncol {
        for row in 0..nrow {
            let mut acc = 0.0;
            for (k, w) in kernel.iter().enumerate() {
                let src = reflect(row as isize + k as isize - radius, nrow);
                acc += w * horizontal[src * ncol + col];
            }
            output[row * ncol + col] = acc;
        }
    }

    output
}

/// Normalized 1D Gaussian weights, length `2 * radius + 1`.
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (TRUNCATE_SIGMAS * sigma + 0.5) as isize;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x as f64 / sigma).powi(2)).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Map an out-of-range index back into `0..n` by mirroring about the edges.
#[inline]
fn reflect(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}
