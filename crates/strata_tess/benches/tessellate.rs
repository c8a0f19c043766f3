use criterion::{black_box, criterion_group, criterion_main, Criterion};
use strata_core::{Affine2D, LineCap, LineJoin, Path, Point, Stroke};
use strata_tess::{
    tessellate_fill, Dasher, FillRule, PathMesh, TessellationConfig, TessellationContext,
};

fn star(points: usize, outer: f32, inner: f32) -> Path {
    let mut vertices = Vec::with_capacity(points * 2);
    for i in 0..points * 2 {
        let r = if i % 2 == 0 { outer } else { inner };
        let a = i as f32 / (points * 2) as f32 * std::f32::consts::TAU;
        vertices.push(Point::new(r * a.cos(), r * a.sin()));
    }
    let mut path = Path::new();
    path.polygon(&vertices);
    path
}

fn circles(count: usize) -> Path {
    let mut path = Path::new();
    for i in 0..count {
        let f = i as f32;
        path.circle(f * 12.0, (f * 0.7).sin() * 40.0, 5.0 + (f % 7.0));
    }
    path
}

fn bench_fill(c: &mut Criterion) {
    let ctx = TessellationContext::new(&TessellationConfig::default());
    let star = star(64, 200.0, 80.0);
    let circles = circles(100);

    c.bench_function("fill_star_64", |b| {
        b.iter(|| {
            let mesh = PathMesh::from_path(black_box(&star), &Affine2D::IDENTITY, &ctx);
            black_box(mesh.fill(&ctx))
        })
    });

    c.bench_function("fill_circles_100", |b| {
        b.iter(|| {
            let mesh = PathMesh::from_path(black_box(&circles), &Affine2D::IDENTITY, &ctx);
            black_box(mesh.fill(&ctx))
        })
    });

    c.bench_function("fill_star_64_lyon", |b| {
        b.iter(|| {
            black_box(tessellate_fill(
                black_box(&star),
                &Affine2D::IDENTITY,
                FillRule::NonZero,
                0.25,
            ))
        })
    });
}

fn bench_stroke(c: &mut Criterion) {
    let stroke = Stroke::new(6.0)
        .with_join(LineJoin::Round)
        .with_cap(LineCap::Round);
    let ctx = TessellationContext::new(&TessellationConfig::default()).with_stroke(&stroke);
    let circles = circles(100);

    c.bench_function("stroke_circles_100_round", |b| {
        b.iter(|| {
            let mesh = PathMesh::from_path(black_box(&circles), &Affine2D::IDENTITY, &ctx);
            black_box(mesh.stroke(&ctx))
        })
    });

    let dasher = Dasher::new(&[8.0, 4.0], 0.0);
    c.bench_function("stroke_circles_100_dashed", |b| {
        b.iter(|| {
            let mesh = PathMesh::from_path(black_box(&circles), &Affine2D::IDENTITY, &ctx);
            match &dasher {
                Some(dasher) => black_box(mesh.stroke_dashed(&ctx, dasher)),
                None => black_box(mesh.stroke(&ctx)),
            }
        })
    });
}

criterion_group!(benches, bench_fill, bench_stroke);
criterion_main!(benches);
