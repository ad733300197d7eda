//! Scoped camera access for the photo step.
//!
//! A [`CameraLease`] starts the device when created and stops it exactly
//! once, however the step is left: capture, skip, retake, or drop.

use crate::media::encode_data_url;
use crate::session::Photo;

/// A camera-like device that yields JPEG frames.
pub trait MediaDevice {
    type Error: std::error::Error + Send + Sync + 'static;

    fn start(&mut self) -> Result<(), Self::Error>;
    fn stop(&mut self);
    /// Grab the current frame as JPEG bytes.
    fn grab_frame(&mut self) -> Result<Vec<u8>, Self::Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError<E: std::error::Error + 'static> {
    #[error("Camera error: {0}")]
    Device(#[source] E),

    #[error("Captured frame is not a valid photo: {0}")]
    InvalidPhoto(#[from] crate::error::CoreError),
}

pub struct CameraLease<D: MediaDevice> {
    device: D,
    active: bool,
}

impl<D: MediaDevice> CameraLease<D> {
    /// Start `device` for the duration of the lease.
    pub fn acquire(mut device: D) -> Result<Self, D::Error> {
        device.start()?;
        Ok(Self {
            device,
            active: true,
        })
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Take a picture and release the camera.
    ///
    /// The camera is released even if grabbing the frame fails.
    pub fn capture(mut self) -> Result<Photo, CaptureError<D::Error>> {
        let frame = self.device.grab_frame();
        self.release();
        let frame = frame.map_err(CaptureError::Device)?;
        Ok(Photo::new(encode_data_url("image/jpeg", &frame))?)
    }

    /// Stop the camera and start it again for another attempt.
    ///
    /// On a failed restart the lease stays released.
    pub fn retake(&mut self) -> Result<(), D::Error> {
        self.release();
        self.device.start()?;
        self.active = true;
        Ok(())
    }

    /// Leave the step without a photo.
    pub fn skip(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.active {
            self.device.stop();
            self.active = false;
            tracing::debug!("Camera released");
        }
    }
}

impl<D: MediaDevice> Drop for CameraLease<D> {
    fn drop(&mut self) {
        self.release();
    }
}
