use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use segnms::lowlevel::{decode_box, sanitize_coordinates};
use segnms::{
    generate_anchors, preset, preset_names, Anchor, BBox, BoxVariance, PostConfig, PostProcessor,
    SegNmsError,
};

#[test]
fn sanitize_output_is_ordered_and_bounded() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..2000 {
        let a = rng.random_range(-50.0f32..150.0);
        let b = rng.random_range(-50.0f32..150.0);
        let extent = rng.random_range(0.0f32..100.0);
        let (lo, hi) = sanitize_coordinates(a, b, extent);
        assert!(0.0 <= lo, "{a} {b} {extent} -> {lo}");
        assert!(lo <= hi, "{a} {b} {extent} -> {lo} {hi}");
        assert!(hi <= extent, "{a} {b} {extent} -> {hi}");
    }
}

#[test]
fn decoded_boxes_are_valid_corners() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..1000 {
        let anchor = Anchor {
            cx: rng.random_range(0.0f32..1.0),
            cy: rng.random_range(0.0f32..1.0),
            w: rng.random_range(0.01f32..0.8),
            h: rng.random_range(0.01f32..0.8),
        };
        let offsets = [
            rng.random_range(-5.0f32..5.0),
            rng.random_range(-5.0f32..5.0),
            rng.random_range(-3.0f32..3.0),
            rng.random_range(-3.0f32..3.0),
        ];
        let b = decode_box(&anchor, offsets, BoxVariance::default());
        assert!(0.0 <= b.x1 && b.x1 <= b.x2 && b.x2 <= 1.0, "{b:?}");
        assert!(0.0 <= b.y1 && b.y1 <= b.y2 && b.y2 <= 1.0, "{b:?}");
    }
}

#[test]
fn scale_unscale_round_trips() {
    let mut rng = StdRng::seed_from_u64(3);
    for img_size in [320.0f32, 550.0, 700.0] {
        for _ in 0..500 {
            let b = BBox::new(
                rng.random::<f32>(),
                rng.random::<f32>(),
                rng.random::<f32>(),
                rng.random::<f32>(),
            );
            let back = b.scale(img_size).unscale(img_size);
            assert!((back.x1 - b.x1).abs() <= 1e-6);
            assert!((back.y1 - b.y1).abs() <= 1e-6);
            assert!((back.x2 - b.x2).abs() <= 1e-6);
            assert!((back.y2 - b.y2).abs() <= 1e-6);
        }
    }
}

#[test]
fn preset_registry_is_enumerable() {
    let names: Vec<&str> = preset_names().collect();
    assert_eq!(names, vec!["coco_r101", "coco_r50", "pascal_r50"]);

    let pascal = preset("pascal_r50").unwrap();
    assert_eq!(pascal.num_classes(), 20);
    assert!(!pascal.anchors.square_anchors);

    assert!(matches!(
        preset("coco_r18"),
        Err(SegNmsError::UnknownPreset { .. })
    ));
}

#[test]
fn preset_builds_processor_with_matching_anchor_count() {
    let base = preset("coco_r101").unwrap();
    let proc = PostProcessor::from_preset(&base).unwrap();
    assert_eq!(proc.anchors().len(), 19248);

    let small = base.with_img_size(400);
    assert_eq!(small.post.img_size, 400);
    let anchors = generate_anchors(&small.anchors).unwrap();
    assert_eq!(anchors.len(), small.anchors.anchor_count());
    assert!(anchors.len() < 19248);
}

#[test]
fn invalid_thresholds_fail_before_processing() {
    let anchors = vec![Anchor {
        cx: 0.5,
        cy: 0.5,
        w: 0.2,
        h: 0.2,
    }];
    let cfg = PostConfig {
        nms_iou_thre: -0.5,
        ..PostConfig::default()
    };
    let err = PostProcessor::new(cfg, anchors.clone()).err().unwrap();
    assert_eq!(
        err,
        SegNmsError::InvalidConfig {
            field: "nms_iou_thre",
            reason: "must be a finite value in [0, 1]",
        }
    );

    let cfg = PostConfig {
        max_detections: 0,
        ..PostConfig::default()
    };
    assert!(PostProcessor::new(cfg, anchors.clone()).is_err());

    assert!(PostProcessor::new(PostConfig::default(), Vec::<Anchor>::new()).is_err());
}
