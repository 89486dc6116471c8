/// Seconds a user waits before another verification code can be requested.
pub const RESEND_COOLDOWN_SECS: u32 = 60;

/// Countdown gating the "resend code" action on the OTP step.
///
/// The timer does not own a clock. Whoever drives it calls [`tick`] once per
/// second while the OTP step is on screen and [`cancel`] when the step goes
/// away; ticks after cancellation are ignored.
///
/// [`tick`]: ResendTimer::tick
/// [`cancel`]: ResendTimer::cancel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResendTimer {
    #[default]
    Idle,
    Counting(u32),
    Expired,
}

impl ResendTimer {
    pub fn started() -> Self {
        ResendTimer::Counting(RESEND_COOLDOWN_SECS)
    }

    pub fn restart(&mut self) {
        *self = Self::started();
    }

    pub fn cancel(&mut self) {
        *self = ResendTimer::Idle;
    }

    /// Advances one second. Returns true when this tick reached zero.
    pub fn tick(&mut self) -> bool {
        match *self {
            ResendTimer::Counting(remaining) if remaining <= 1 => {
                *self = ResendTimer::Expired;
                true
            }
            ResendTimer::Counting(remaining) => {
                *self = ResendTimer::Counting(remaining - 1);
                false
            }
            ResendTimer::Idle | ResendTimer::Expired => false,
        }
    }

    pub fn remaining(&self) -> u32 {
        match self {
            ResendTimer::Counting(remaining) => *remaining,
            ResendTimer::Idle | ResendTimer::Expired => 0,
        }
    }

    pub fn is_counting(&self) -> bool {
        matches!(self, ResendTimer::Counting(_))
    }

    pub fn can_resend(&self) -> bool {
        matches!(self, ResendTimer::Expired)
    }
}
