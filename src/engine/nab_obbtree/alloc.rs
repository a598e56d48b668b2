use std::collections::TryReserveError;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use crate::app::FatalErrorCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocError
{
    Reserve(TryReserveError),
    CapacityOverflow { requested: usize },
}
impl FatalErrorCode for AllocError
{
    fn error_code(&self) -> u16
    {
        match self
        {
            Self::Reserve(_) => 0,
            Self::CapacityOverflow { .. } => 1,
        }
    }
}
impl Display for AllocError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Debug::fmt(self, f) }
}
impl Error for AllocError
{
    fn source(&self) -> Option<&(dyn Error + 'static)>
    {
        match self
        {
            Self::Reserve(err) => Some(err),
            Self::CapacityOverflow { .. } => None,
        }
    }
}
impl From<TryReserveError> for AllocError
{
    fn from(err: TryReserveError) -> Self { Self::Reserve(err) }
}

// Grow the backing storage of `vec` to hold exactly `capacity` elements
// Existing elements are moved, never reordered
pub fn reserve_exact_to<T>(vec: &mut Vec<T>, capacity: usize) -> Result<(), AllocError>
{
    if capacity <= vec.capacity()
    {
        return Ok(());
    }
    let additional = capacity - vec.len();
    vec.try_reserve_exact(additional)?;
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn reserve()
    {
        let mut v: Vec<u64> = vec![1, 2, 3];
        reserve_exact_to(&mut v, 32).unwrap();
        assert!(v.capacity() >= 32);
        assert_eq!(v, [1, 2, 3]);

        // shrinking requests are ignored
        let cap = v.capacity();
        reserve_exact_to(&mut v, 4).unwrap();
        assert_eq!(v.capacity(), cap);
    }

    #[test]
    fn reserve_too_much()
    {
        let mut v: Vec<u64> = Vec::new();
        let err = reserve_exact_to(&mut v, usize::MAX).unwrap_err();
        assert!(matches!(err, AllocError::Reserve(_)));
        assert_eq!(err.error_code(), 0);
        assert!(err.source().is_some());
    }
}
