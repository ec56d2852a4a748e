use crate::{manipulator::GrabFrame, Pose};

/// Moves the object rigidly with the first grab point, keeping the offset
/// captured when the grab began.
#[derive(Clone, Debug, Default)]
pub struct SinglePointGrab {
    offset: Option<Pose>,
}

impl SinglePointGrab {
    pub fn new() -> Self {
        Self { offset: None }
    }

    pub fn begin(&mut self, frame: &GrabFrame) {
        self.offset = frame
            .grabs
            .first()
            .map(|grab| grab.inverse() * frame.target);
    }

    pub fn update(&mut self, frame: &GrabFrame) -> Option<Pose> {
        let grab = frame.grabs.first()?;
        let offset = self.offset?;
        Some(*grab * offset)
    }

    pub fn end(&mut self) {
        self.offset = None;
    }
}
