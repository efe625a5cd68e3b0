use ndarray::{Array2, Array3};
use segnms::{
    generate_anchors, AnchorConfig, AnchorLevel, NmsStrategy, PostConfig, PostProcessor,
    Prototypes, RawPrediction,
};

const GRID: usize = 6;
const CLASSES: usize = 3;
const K: usize = 2;

/// A 6x6 grid of 0.15-wide anchors with a few planted objects.
struct Scene {
    anchors: AnchorConfig,
    offsets: Array2<f32>,
    /// Includes the background column.
    scores: Array2<f32>,
    coeffs: Array2<f32>,
    protos: Array3<f32>,
}

impl Scene {
    fn new() -> Self {
        let anchors = AnchorConfig {
            img_size: 100,
            levels: vec![AnchorLevel {
                grid_h: GRID,
                grid_w: GRID,
                scales: vec![15.0],
            }],
            aspect_ratios: vec![1.0],
            square_anchors: false,
        };
        let n = anchors.anchor_count();
        let mut scores = Array2::<f32>::zeros((n, CLASSES + 1));
        scores.column_mut(0).fill(0.9);
        let mut coeffs = Array2::<f32>::zeros((n, K));
        coeffs.column_mut(1).fill(1.0);

        let mut scene = Self {
            anchors,
            offsets: Array2::zeros((n, 4)),
            scores,
            coeffs,
            protos: Array3::from_shape_fn((24, 24, K), |(_, _, k)| if k == 0 { 6.0 } else { -6.0 }),
        };
        scene.plant(7, 1, 0.95);
        // Duplicate of anchor 7 shifted onto it from the neighbouring cell.
        scene.plant(8, 1, 0.6);
        scene.offsets[[8, 0]] = -10.5;
        scene.plant(20, 0, 0.8);
        scene.plant(33, 2, 0.3);
        scene
    }

    fn plant(&mut self, anchor: usize, class_id: usize, score: f32) {
        self.scores[[anchor, 0]] = 1.0 - score;
        self.scores[[anchor, class_id + 1]] = score;
        self.coeffs[[anchor, 0]] = 1.0;
        self.coeffs[[anchor, 1]] = 0.0;
    }

    fn processor(&self, cfg: PostConfig) -> PostProcessor {
        PostProcessor::new(cfg, generate_anchors(&self.anchors).unwrap()).unwrap()
    }

    fn raw(&self) -> RawPrediction<'_> {
        RawPrediction::with_background(self.offsets.view(), self.scores.view(), self.coeffs.view())
            .unwrap()
    }

    fn protos(&self) -> Prototypes<'_> {
        Prototypes::new(self.protos.view()).unwrap()
    }
}

fn base_config() -> PostConfig {
    PostConfig {
        img_size: 100,
        nms_score_thre: 0.1,
        nms: NmsStrategy::Fast {
            second_threshold: true,
        },
        ..PostConfig::default()
    }
}

#[test]
fn pipeline_returns_ranked_instances_with_masks() {
    let scene = Scene::new();
    let proc = scene.processor(base_config());
    let seg = proc.process(&scene.raw(), &scene.protos(), 640, 480).unwrap();

    assert_eq!(seg.image_width, 640);
    assert_eq!(seg.image_height, 480);
    let summary: Vec<(usize, f32)> = seg.instances.iter().map(|i| (i.class_id, i.score)).collect();
    assert_eq!(summary, vec![(1, 0.95), (0, 0.8), (2, 0.3)]);

    let first = &seg.instances[0];
    // Anchor 7 sits in cell (1, 1): center 0.25, side 0.15.
    assert!((first.pixel_box.x1 as i64 - 112).abs() <= 1);
    assert!((first.pixel_box.x2 as i64 - 208).abs() <= 1);
    assert!((first.pixel_box.y1 as i64 - 84).abs() <= 1);
    assert!((first.pixel_box.y2 as i64 - 156).abs() <= 1);

    for inst in &seg.instances {
        let b = inst.pixel_box;
        let cx = ((b.x1 + b.x2) / 2) as usize;
        let cy = ((b.y1 + b.y2) / 2) as usize;
        assert_eq!(inst.mask.width(), 640);
        assert_eq!(inst.mask.height(), 480);
        assert_eq!(inst.mask.get(cx, cy), Some(true));
        assert_eq!(inst.mask.get(639, 0), Some(false));
        assert!(inst.mask.area() > 0);
        assert!(inst.mask.area() < 640 * 480 / 10);
    }
}

#[test]
fn nothing_above_threshold_yields_empty_result() {
    let scene = Scene::new();
    let proc = scene.processor(PostConfig {
        nms_score_thre: 0.99,
        ..base_config()
    });
    let seg = proc.process(&scene.raw(), &scene.protos(), 320, 240).unwrap();
    assert!(seg.is_empty());
    assert_eq!(seg.len(), 0);
    assert_eq!((seg.image_width, seg.image_height), (320, 240));
    assert!(proc.detect(&scene.raw()).unwrap().is_empty());
}

#[test]
fn visual_threshold_filters_after_suppression() {
    let scene = Scene::new();
    let proc = scene.processor(PostConfig {
        visual_thre: 0.5,
        ..base_config()
    });
    let seg = proc.process(&scene.raw(), &scene.protos(), 320, 240).unwrap();
    let classes: Vec<usize> = seg.instances.iter().map(|i| i.class_id).collect();
    assert_eq!(classes, vec![1, 0]);
}

#[test]
fn max_detections_caps_output() {
    let scene = Scene::new();
    let proc = scene.processor(PostConfig {
        max_detections: 2,
        ..base_config()
    });
    let seg = proc.process(&scene.raw(), &scene.protos(), 320, 240).unwrap();
    assert_eq!(seg.len(), 2);
}

#[test]
fn strategies_are_interchangeable_on_a_clean_scene() {
    let scene = Scene::new();
    let fast = scene.processor(base_config());
    let traditional = scene.processor(PostConfig {
        nms: NmsStrategy::Traditional {
            inclusive_area: false,
        },
        ..base_config()
    });

    let a = fast.process(&scene.raw(), &scene.protos(), 210, 210).unwrap();
    let b = traditional.process(&scene.raw(), &scene.protos(), 210, 210).unwrap();
    assert_eq!(a.len(), b.len());
    for (x, y) in a.instances.iter().zip(&b.instances) {
        assert_eq!(x.class_id, y.class_id);
        assert_eq!(x.score, y.score);
        assert_eq!(x.pixel_box, y.pixel_box);
        assert_eq!(x.mask, y.mask);
    }
}

#[test]
fn fast_nms_without_second_threshold_keeps_cross_class_entries() {
    let scene = Scene::new();
    let proc = scene.processor(PostConfig {
        nms: NmsStrategy::Fast {
            second_threshold: false,
        },
        ..base_config()
    });
    let dets = proc.detect(&scene.raw()).unwrap();
    // Every surviving anchor competes in every class; low-score entries for
    // other classes come back with score 0.
    assert!(dets.len() > 3);
    assert!(dets.iter().any(|d| d.score == 0.0));
    assert_eq!(dets[0].anchor, 7);
}
