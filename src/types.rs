/// A single body keypoint in normalized image coordinates.
///
/// `x` and `y` are fractions of the frame width and height. `visibility` is the
/// detector's confidence that the point is present and unoccluded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, z: 0.0, visibility }
    }

    /// Pixel position of the landmark in a frame of the given size.
    pub fn to_pixel(&self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Landmark index layout of a pose detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skeleton {
    /// 17 COCO keypoints (YOLOv8-pose).
    Coco17,
    /// 33 BlazePose keypoints (MediaPipe layout).
    BlazePose33,
}

impl Skeleton {
    pub fn landmark_count(&self) -> usize {
        match self {
            Skeleton::Coco17 => 17,
            Skeleton::BlazePose33 => 33,
        }
    }

    /// Shoulder, elbow and wrist indices for one side.
    pub fn arm_indices(&self, side: Side) -> [usize; 3] {
        match (self, side) {
            (Skeleton::Coco17, Side::Left) => [5, 7, 9],
            (Skeleton::Coco17, Side::Right) => [6, 8, 10],
            (Skeleton::BlazePose33, Side::Left) => [11, 13, 15],
            (Skeleton::BlazePose33, Side::Right) => [12, 14, 16],
        }
    }

    pub fn shoulder_index(&self, side: Side) -> usize {
        self.arm_indices(side)[0]
    }
}

/// Landmarks for one detected person.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseResult {
    pub skeleton: Skeleton,
    pub landmarks: Vec<Landmark>,
}

impl PoseResult {
    pub fn new(skeleton: Skeleton, landmarks: Vec<Landmark>) -> Self {
        Self { skeleton, landmarks }
    }

    pub fn shoulder(&self, side: Side) -> Option<Landmark> {
        self.landmarks.get(self.skeleton.shoulder_index(side)).copied()
    }

    /// Fixed-index lookup of one arm. `None` when the result is too short.
    pub fn arm(&self, side: Side) -> Option<ArmTriple> {
        let [s, e, w] = self.skeleton.arm_indices(side);
        Some(ArmTriple {
            shoulder: *self.landmarks.get(s)?,
            elbow: *self.landmarks.get(e)?,
            wrist: *self.landmarks.get(w)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmTriple {
    pub shoulder: Landmark,
    pub elbow: Landmark,
    pub wrist: Landmark,
}

impl ArmTriple {
    pub fn points(&self) -> [Landmark; 3] {
        [self.shoulder, self.elbow, self.wrist]
    }
}

/// Elbow angles for both arms, each in [0, 360).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AngleReading {
    pub left_degrees: f64,
    pub right_degrees: f64,
}
