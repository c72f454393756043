use crate::core::ports::PunchSource;
use crate::errors::AppResult;
use crate::models::punch::DevicePunch;
use chrono::NaiveDateTime;

/// A fixed batch held in memory. Each `fetch` hands out the same punches.
#[derive(Debug, Clone)]
pub struct VecPunchSource {
    id: String,
    punches: Vec<DevicePunch>,
}

impl VecPunchSource {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            punches: Vec::new(),
        }
    }

    pub fn punch(mut self, user_id: &str, timestamp: NaiveDateTime) -> Self {
        self.punches.push(DevicePunch {
            user_id: user_id.to_string(),
            timestamp,
            status: 0,
            punch: 0,
        });
        self
    }

    pub fn with(mut self, punch: DevicePunch) -> Self {
        self.punches.push(punch);
        self
    }

    pub fn len(&self) -> usize {
        self.punches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.punches.is_empty()
    }
}

impl PunchSource for VecPunchSource {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn fetch(&mut self) -> AppResult<Vec<DevicePunch>> {
        Ok(self.punches.clone())
    }
}
