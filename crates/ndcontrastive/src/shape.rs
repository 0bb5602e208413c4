//! Legacy four-axis shape view.
//!
//! Loss inputs are addressed as `(num, channels, height, width)`. Tensors of
//! rank below four are read with their missing trailing axes set to 1, so a
//! feature matrix `[N, C]` is `(N, C, 1, 1)` and a label vector `[N]` is
//! `(N, 1, 1, 1)`.

use crate::error::TensorError;

/// Maximum rank accepted by [`Shape4::from_dims`].
pub const MAX_LEGACY_RANK: usize = 4;

/// An `(N, C, H, W)` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape4 {
    pub num: usize,
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl Shape4 {
    /// Construct from explicit axis lengths.
    pub const fn new(num: usize, channels: usize, height: usize, width: usize) -> Self {
        Self {
            num,
            channels,
            height,
            width,
        }
    }

    /// Interpret an arbitrary shape of rank `<= 4` as `(N, C, H, W)`.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::RankMismatch` for rank above four.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndcontrastive::shape::Shape4;
    ///
    /// let s = Shape4::from_dims(&[8, 16]).unwrap();
    /// assert_eq!(s, Shape4::new(8, 16, 1, 1));
    /// assert_eq!(s.spatial_dim(), 1);
    /// ```
    pub fn from_dims(dims: &[usize]) -> Result<Self, TensorError> {
        if dims.len() > MAX_LEGACY_RANK {
            return Err(TensorError::RankMismatch {
                max: MAX_LEGACY_RANK,
                actual: dims.len(),
            });
        }
        let axis = |i: usize| dims.get(i).copied().unwrap_or(1);
        Ok(Self::new(axis(0), axis(1), axis(2), axis(3)))
    }

    /// Total element count, or `None` if it overflows `usize`.
    pub fn checked_count(&self) -> Option<usize> {
        self.num
            .checked_mul(self.channels)?
            .checked_mul(self.height)?
            .checked_mul(self.width)
    }

    /// Number of spatial positions per channel, `H * W`.
    ///
    /// This and the other products below assume a shape whose
    /// [`checked_count`](Self::checked_count) is `Some`.
    #[inline]
    pub fn spatial_dim(&self) -> usize {
        self.height * self.width
    }

    /// Total element count, `N * C * H * W`.
    #[inline]
    pub fn count(&self) -> usize {
        self.num * self.channels * self.spatial_dim()
    }

    /// Number of compared pairs, `N * H * W`.
    #[inline]
    pub fn pairs(&self) -> usize {
        self.num * self.spatial_dim()
    }

    /// Same shape with the channel axis collapsed to 1.
    #[inline]
    pub fn with_single_channel(&self) -> Self {
        Self::new(self.num, 1, self.height, self.width)
    }

    /// Dimensions as a rank-4 array.
    #[inline]
    pub fn dims(&self) -> [usize; 4] {
        [self.num, self.channels, self.height, self.width]
    }

    /// Reject any axis of length zero.
    pub(crate) fn require_nonempty(&self, tensor: &'static str) -> Result<(), TensorError> {
        let axes = [
            ("num", self.num),
            ("channels", self.channels),
            ("height", self.height),
            ("width", self.width),
        ];
        match axes.iter().find(|(_, len)| *len == 0) {
            Some(&(axis, _)) => Err(TensorError::ZeroSizedAxis { tensor, axis }),
            None => Ok(()),
        }
    }
}

impl std::fmt::Display for Shape4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.num, self.channels, self.height, self.width
        )
    }
}
