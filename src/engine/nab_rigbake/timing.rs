use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::ops::{Add, Sub};
use std::time::Duration;

macro_rules! generate_time_primitive
{
    ($name:ident, $type:ty, $suffix:literal) =>
    {
        #[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd)]
        pub struct $name(pub $type);
        impl $name
        {
            pub const ZERO: Self = Self(0.0);

            #[inline] #[must_use]
            pub fn max(self, other: Self) -> Self { Self(self.0.max(other.0)) }
        }
        // NaN sorts last
        impl Ord for $name
        {
            fn cmp(&self, other: &Self) -> Ordering { self.0.total_cmp(&other.0) }
        }
        impl Eq for $name { }
        impl Add for $name
        {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output { Self(self.0 + rhs.0) }
        }
        impl Sub for $name
        {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output { Self(self.0 - rhs.0) }
        }
        impl Display for $name
        {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
            {
                Display::fmt(&self.0, f)?;
                f.write_str($suffix)
            }
        }
    };
}

generate_time_primitive!(FSeconds, f32, "s");
generate_time_primitive!(FMilliseconds, f32, "ms");

impl From<FSeconds> for FMilliseconds { fn from(sec: FSeconds) -> Self { Self(sec.0 * 1_000.0) } }
impl From<FMilliseconds> for FSeconds { fn from(ms: FMilliseconds) -> Self { Self(ms.0 / 1_000.0) } }

impl From<Duration> for FSeconds { fn from(d: Duration) -> Self { Self(d.as_secs_f32()) } }
impl From<Duration> for FMilliseconds { fn from(d: Duration) -> Self { Self(d.as_secs_f32() * 1_000.0) } }

#[cfg(test)]
mod tests
{
    use approx::assert_relative_eq;
    use super::*;

    #[test]
    fn conversions()
    {
        let ms = FMilliseconds::from(FSeconds(1.5));
        assert_relative_eq!(ms.0, 1500.0);
        assert_relative_eq!(FSeconds::from(ms).0, 1.5);
        assert_relative_eq!(FSeconds::from(Duration::from_millis(250)).0, 0.25);
    }

    #[test]
    fn ordering()
    {
        let mut times = vec![FSeconds(2.0), FSeconds(0.5), FSeconds(1.0)];
        times.sort();
        assert_eq!(times, vec![FSeconds(0.5), FSeconds(1.0), FSeconds(2.0)]);
        assert_eq!(FSeconds(-1.0).max(FSeconds::ZERO), FSeconds::ZERO);
    }

    #[test]
    fn display()
    {
        assert_eq!(FSeconds(0.5).to_string(), "0.5s");
        assert_eq!(FMilliseconds(12.0).to_string(), "12ms");
    }
}
