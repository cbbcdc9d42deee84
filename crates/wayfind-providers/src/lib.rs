mod motion_sensors;
mod speech;

pub use motion_sensors::{
    AccelerometerSample, MagnetometerSample, MockSensorPlatform, MotionSampler,
    MotionSensorPlatform, RawSensorEvent, SensorSubscription, DEFAULT_SAMPLE_INTERVAL,
};
pub use speech::{NullSpeech, RecordingSpeech, SpeechError, SpeechSynthesizer};
