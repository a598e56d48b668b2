use std::fmt::{Display, Formatter};

pub struct FormatBinary
{
    pub bytes: f64
}
#[allow(non_upper_case_globals)]
impl FormatBinary
{
    pub const Ki: f64 = 1.0 * 1024.0; // Kibi (Ki)
    pub const Mi: f64 = Self::Ki * 1024.0; // Mebi (Mi)
    pub const Gi: f64 = Self::Mi * 1024.0; // Gibi (Gi)
    pub const Ti: f64 = Self::Gi * 1024.0; // Tebi (Ti)
}
impl Display for FormatBinary
{
    #[allow(clippy::identity_op)]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        let div =
        {
            if self.bytes > Self::Ti
            {
                (self.bytes / Self::Ti, "Ti")
            }
            else if self.bytes > Self::Gi
            {
                (self.bytes / Self::Gi, "Gi")
            }
            else if self.bytes > Self::Mi
            {
                (self.bytes / Self::Mi, "Mi")
            }
            else if self.bytes > Self::Ki
            {
                (self.bytes / Self::Ki, "Ki")
            }
            else
            {
                (self.bytes, "")
            }
        };
        Display::fmt(&div.0, f)?;
        if f.alternate() { f.write_str(" ")?; }
        f.write_str(div.1)
    }
}
#[macro_export]
macro_rules! format_binary
{
    ($val:expr) => { $crate::utils::FormatBinary { bytes: $val as f64 } };
}
#[cfg(test)]
mod format_binary_tests
{
    use super::*;

    #[test]
    fn values()
    {
        assert_eq!("123", format!("{}", format_binary!(123.0)));
        assert_eq!("123Ki", format!("{}", format_binary!(123.0 * FormatBinary::Ki)));
        assert_eq!("123Mi", format!("{}", format_binary!(123.0 * FormatBinary::Mi)));
        assert_eq!("123 Gi", format!("{:#}", format_binary!(123.0 * FormatBinary::Gi)));
    }

    #[test]
    fn decimals()
    {
        assert_eq!("2.50Ki", format!("{:.2}", format_binary!(2560usize)));
    }
}

pub trait ShortTypeName
{
    fn short_type_name() -> &'static str;
}
impl<T> ShortTypeName for T
{
    #[inline]
    fn short_type_name() -> &'static str
    {
        let type_name = std::any::type_name::<T>();
        // generic args would otherwise confuse the search
        let base = match type_name.find('<')
        {
            None => type_name,
            Some(i) => &type_name[..i],
        };
        match base.rfind(':')
        {
            None => base,
            Some(i) => &base[(i + 1)..]
        }
    }
}

#[cfg(test)]
mod short_type_name_tests
{
    use super::*;

    struct Plain;
    struct Generic<T>(T);

    #[test]
    fn names()
    {
        assert_eq!(Plain::short_type_name(), "Plain");
        assert_eq!(Generic::<Plain>::short_type_name(), "Generic");
        assert_eq!(u32::short_type_name(), "u32");
    }
}
