use glam::{Mat3, Vec3};

/// Lower left triangle (including diagonal) of a symmetric 3x3 matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Symmetric3x3
{
    pub xx: f32,
    pub yx: f32,
    pub yy: f32,
    pub zx: f32,
    pub zy: f32,
    pub zz: f32,
}

/// Eigenvalues sorted largest first, with the matching unit eigenvectors as the columns of `vectors`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EigenDecomposition
{
    pub values: Vec3,
    pub vectors: Mat3,
}

impl Symmetric3x3
{
    const JACOBI_MAX_SWEEPS: usize = 24;

    /// Mean and (population) covariance of a point cloud, `None` if it is empty.
    #[must_use]
    pub fn covariance(points: &[Vec3]) -> Option<(Vec3, Self)>
    {
        if points.is_empty()
        {
            return None;
        }

        let inv_count = 1.0 / points.len() as f32;
        let mean = points.iter().copied().sum::<Vec3>() * inv_count;

        let mut cov = Self::default();
        for p in points
        {
            let d = *p - mean;
            cov.xx += d.x * d.x;
            cov.yx += d.y * d.x;
            cov.yy += d.y * d.y;
            cov.zx += d.z * d.x;
            cov.zy += d.z * d.y;
            cov.zz += d.z * d.z;
        }
        Some((mean, cov.scaled(inv_count)))
    }

    #[inline] #[must_use]
    pub fn scaled(self, s: f32) -> Self
    {
        Self
        {
            xx: self.xx * s,
            yx: self.yx * s,
            yy: self.yy * s,
            zx: self.zx * s,
            zy: self.zy * s,
            zz: self.zz * s,
        }
    }

    #[inline] #[must_use]
    pub fn to_rows(self) -> [[f32; 3]; 3]
    {
        [
            [self.xx, self.yx, self.zx],
            [self.yx, self.yy, self.zy],
            [self.zx, self.zy, self.zz],
        ]
    }

    #[inline] #[must_use]
    pub fn to_mat3(self) -> Mat3
    {
        // symmetric, so row and column order agree
        Mat3::from_cols_array_2d(&self.to_rows())
    }

    /// Cyclic Jacobi eigen-decomposition.
    /// The returned basis is orthonormal and right-handed; the first column spans the largest spread.
    #[must_use]
    pub fn eigen(self) -> EigenDecomposition
    {
        let mut a = self.to_rows();
        let mut v = [[1.0f32, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]; // v[row][col], columns are eigenvectors

        let norm_sq: f32 = a.iter().flatten().map(|x| x * x).sum();
        let tolerance = norm_sq * f32::EPSILON * f32::EPSILON;

        for _ in 0..Self::JACOBI_MAX_SWEEPS
        {
            let off_sq = a[0][1] * a[0][1] + a[0][2] * a[0][2] + a[1][2] * a[1][2];
            if off_sq <= tolerance
            {
                break;
            }

            for (p, q) in [(0, 1), (0, 2), (1, 2)]
            {
                let apq = a[p][q];
                if apq == 0.0
                {
                    continue;
                }

                let theta = (a[q][q] - a[p][p]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                a[p][p] -= t * apq;
                a[q][q] += t * apq;
                a[p][q] = 0.0;
                a[q][p] = 0.0;

                for r in 0..3
                {
                    if r != p && r != q
                    {
                        let arp = a[r][p];
                        let arq = a[r][q];
                        a[r][p] = c * arp - s * arq;
                        a[p][r] = a[r][p];
                        a[r][q] = s * arp + c * arq;
                        a[q][r] = a[r][q];
                    }

                    let vrp = v[r][p];
                    let vrq = v[r][q];
                    v[r][p] = c * vrp - s * vrq;
                    v[r][q] = s * vrp + c * vrq;
                }
            }
        }

        let mut order = [0usize, 1, 2];
        // stable, so equal spreads keep their original axis order
        order.sort_by(|&i, &j| a[j][j].total_cmp(&a[i][i]));

        let column = |c: usize| Vec3::new(v[0][c], v[1][c], v[2][c]);
        let x_axis = column(order[0]).normalize_or(Vec3::X);
        let y_axis = column(order[1]).normalize_or(Vec3::Y);
        let z_axis = x_axis.cross(y_axis).normalize_or(Vec3::Z);

        EigenDecomposition
        {
            values: Vec3::new(a[order[0]][order[0]], a[order[1]][order[1]], a[order[2]][order[2]]),
            vectors: Mat3::from_cols(x_axis, y_axis, z_axis),
        }
    }
}

#[cfg(test)]
mod tests
{
    use approx::assert_abs_diff_eq;
    use super::*;

    #[test]
    fn covariance_empty()
    {
        assert!(Symmetric3x3::covariance(&[]).is_none());
    }

    #[test]
    fn covariance_line()
    {
        let points = [Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0)];
        let (mean, cov) = Symmetric3x3::covariance(&points).unwrap();
        assert_abs_diff_eq!(mean, Vec3::new(1.5, 0.0, 0.0));
        assert_abs_diff_eq!(cov.xx, 1.25);
        assert_eq!(cov.yy, 0.0);
        assert_eq!(cov.zz, 0.0);
        assert_eq!(cov.yx, 0.0);
    }

    #[test]
    fn eigen_diagonal_sorted()
    {
        let m = Symmetric3x3 { xx: 1.0, yy: 5.0, zz: 3.0, ..Default::default() };
        let eigen = m.eigen();
        assert_abs_diff_eq!(eigen.values, Vec3::new(5.0, 3.0, 1.0));
        assert_abs_diff_eq!(eigen.vectors.x_axis.abs(), Vec3::Y);
        assert_abs_diff_eq!(eigen.vectors.y_axis.abs(), Vec3::Z);
        assert_abs_diff_eq!(eigen.vectors.z_axis.abs(), Vec3::X);
    }

    #[test]
    fn eigen_reconstructs()
    {
        let m = Symmetric3x3 { xx: 4.0, yx: 1.0, yy: 3.0, zx: -0.5, zy: 0.25, zz: 2.0 };
        let eigen = m.eigen();

        // columns are orthonormal and right-handed
        let r = eigen.vectors;
        assert_abs_diff_eq!(r.transpose() * r, Mat3::IDENTITY, epsilon = 1e-5);
        assert_abs_diff_eq!(r.determinant(), 1.0, epsilon = 1e-5);

        // M = R * diag(values) * R^T
        let rebuilt = r * Mat3::from_diagonal(eigen.values) * r.transpose();
        assert_abs_diff_eq!(rebuilt, m.to_mat3(), epsilon = 1e-4);

        assert!(eigen.values.x >= eigen.values.y && eigen.values.y >= eigen.values.z);
    }

    #[test]
    fn eigen_zero()
    {
        let eigen = Symmetric3x3::default().eigen();
        assert_eq!(eigen.values, Vec3::ZERO);
        assert_eq!(eigen.vectors, Mat3::IDENTITY);
    }
}
