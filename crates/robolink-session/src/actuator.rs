//! Robot actuator seam.
//!
//! Motor drivers implement [`Actuator`]; the receive duty only ever calls
//! [`Actuator::apply`], so drivers can be swapped without touching the link.

use robolink_frame::Directive;

/// Default drive speed, in the driver's own units.
pub const DEFAULT_SPEED: u8 = 30;
/// Heading used for a LEFT directive, in degrees.
pub const LEFT_ANGLE: u16 = 90;
/// Heading used for a RIGHT directive, in degrees.
pub const RIGHT_ANGLE: u16 = 270;

/// Motion primitives of the drive base.
///
/// Every call is fire-and-forget and must return within one bounded
/// actuation call. The speed is fixed when the driver is built; there is no
/// way to change it while a session runs.
pub trait Actuator: Send {
    /// Drive forward at the configured speed.
    fn forward(&mut self);

    /// Drive backward at the configured speed.
    fn backward(&mut self);

    /// Drive towards `angle` degrees (0 = ahead, counter-clockwise) at `speed`.
    fn move_towards(&mut self, angle: u16, speed: u8);

    /// Stop all motion. Calling it while stopped is a no-op.
    fn stop(&mut self);

    /// Speed used for LEFT/RIGHT moves.
    fn speed(&self) -> u8 {
        DEFAULT_SPEED
    }

    /// Carry out one decoded directive.
    fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::Forward => self.forward(),
            Directive::Backward => self.backward(),
            Directive::Left => {
                let speed = self.speed();
                self.move_towards(LEFT_ANGLE, speed);
            }
            Directive::Right => {
                let speed = self.speed();
                self.move_towards(RIGHT_ANGLE, speed);
            }
            Directive::Stop => self.stop(),
        }
    }
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn forward(&mut self) {
        (**self).forward();
    }

    fn backward(&mut self) {
        (**self).backward();
    }

    fn move_towards(&mut self, angle: u16, speed: u8) {
        (**self).move_towards(angle, speed);
    }

    fn stop(&mut self) {
        (**self).stop();
    }

    fn speed(&self) -> u8 {
        (**self).speed()
    }

    fn apply(&mut self, directive: Directive) {
        (**self).apply(directive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Call {
        Forward,
        Backward,
        Move(u16, u8),
        Stop,
    }

    struct MockActuator {
        speed: u8,
        calls: Vec<Call>,
    }

    impl Actuator for MockActuator {
        fn forward(&mut self) {
            self.calls.push(Call::Forward);
        }

        fn backward(&mut self) {
            self.calls.push(Call::Backward);
        }

        fn move_towards(&mut self, angle: u16, speed: u8) {
            self.calls.push(Call::Move(angle, speed));
        }

        fn stop(&mut self) {
            self.calls.push(Call::Stop);
        }

        fn speed(&self) -> u8 {
            self.speed
        }
    }

    #[test]
    fn apply_maps_every_directive() {
        let mut act = MockActuator {
            speed: 45,
            calls: Vec::new(),
        };

        for directive in Directive::ALL {
            act.apply(directive);
        }

        assert_eq!(
            act.calls,
            [
                Call::Forward,
                Call::Backward,
                Call::Move(90, 45),
                Call::Move(270, 45),
                Call::Stop,
            ]
        );
    }

    #[test]
    fn boxed_actuator_forwards_calls() {
        let mut boxed: Box<MockActuator> = Box::new(MockActuator {
            speed: DEFAULT_SPEED,
            calls: Vec::new(),
        });

        Actuator::apply(&mut boxed, Directive::Left);
        assert_eq!(boxed.calls, [Call::Move(LEFT_ANGLE, DEFAULT_SPEED)]);
    }
}
