//! Small helper trait mirroring [`std::iter::FromIterator`] for fallible
//! conversions, used by the validated key/value collections in [`crate::kvp`].

/// Fallible counterpart of [`FromIterator`]. Implemented for collections whose
/// elements require validation (such as [`crate::kvp::Labels`]), where
/// construction from an iterator can fail part-way through.
pub trait TryFromIterator<A>: Sized {
    type Error;

    fn try_from_iter<I: IntoIterator<Item = A>>(iter: I) -> Result<Self, Self::Error>;
}
