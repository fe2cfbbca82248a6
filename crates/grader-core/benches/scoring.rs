use criterion::{black_box, criterion_group, criterion_main, Criterion};

use grader_core::aggregate::calculate_final_results;
use grader_core::fallback::generate_fallback_feedback;
use grader_core::gate::is_valid_answer;
use grader_core::model::{AnswerSubmission, ExecutionResult, QuestionType};
use grader_core::results::{EvaluatedAnswer, FeedbackSource};

const CODE: &str = r#"
function mergeIntervals(intervals) {
    if (intervals.length === 0) return [];
    intervals.sort((a, b) => a[0] - b[0]);
    const merged = [intervals[0]];
    for (let i = 1; i < intervals.length; i++) {
        const last = merged[merged.length - 1];
        if (intervals[i][0] <= last[1]) {
            last[1] = Math.max(last[1], intervals[i][1]);
        } else {
            merged.push(intervals[i]);
        }
    }
    return merged;
}
"#;

const TECHNICAL: &str = "A load balancer spreads requests across servers. For example, round \
robin sends each request to the next server in turn, which works well because requests are \
usually similar in cost, and health checks remove failed instances.";

const BEHAVIORAL: &str = "At my previous company our on-call rotation was burning people out. \
I proposed splitting the pager by service and I wrote runbooks for the noisiest alerts. As a \
result, pages per week dropped by sixty percent.";

fn bench_fallback(c: &mut Criterion) {
    let mut group = c.benchmark_group("fallback");
    let run = ExecutionResult {
        output: Some("[[1,6],[8,10]]".into()),
        ..Default::default()
    };

    group.bench_function("coding", |b| {
        b.iter(|| {
            generate_fallback_feedback(
                black_box("coding"),
                "",
                black_box(Some(CODE)),
                Some("javascript"),
                Some(&run),
            )
        })
    });

    group.bench_function("technical", |b| {
        b.iter(|| generate_fallback_feedback(black_box("technical"), black_box(TECHNICAL), None, None, None))
    });

    group.bench_function("behavioral", |b| {
        b.iter(|| generate_fallback_feedback(black_box("behavioral"), black_box(BEHAVIORAL), None, None, None))
    });

    group.finish();
}

fn bench_gate(c: &mut Criterion) {
    let mut group = c.benchmark_group("gate");

    group.bench_function("code", |b| {
        b.iter(|| is_valid_answer("", black_box(QuestionType::Coding), black_box(Some(CODE))))
    });

    group.bench_function("text", |b| {
        b.iter(|| is_valid_answer(black_box(BEHAVIORAL), QuestionType::Behavioral, None))
    });

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for size in [10usize, 100, 1000] {
        let responses: Vec<EvaluatedAnswer> = (0..size)
            .map(|i| {
                let qt = QuestionType::ALL[i % 3];
                let mut answer = AnswerSubmission::new(&format!("q{i}"), qt, TECHNICAL);
                answer.skipped = i % 7 == 0;
                answer.response_time = (i as u64 * 13) % 600;
                let feedback = generate_fallback_feedback(qt.as_str(), TECHNICAL, Some(CODE), None, None);
                EvaluatedAnswer::new(answer, feedback, FeedbackSource::Heuristic)
            })
            .collect();

        group.bench_function(format!("n={size}"), |b| {
            b.iter(|| calculate_final_results(black_box(&responses), 3600))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fallback, bench_gate, bench_aggregate);
criterion_main!(benches);
