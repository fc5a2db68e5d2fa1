use std::collections::BTreeSet;

use proptest::prelude::*;

use lingo_tutor::content::QuizQuestion;
use lingo_tutor::session::exam::score;
use lingo_tutor::session::progress::{ProgressUpdate, Section, TopicProgress};

fn word() -> impl Strategy<Value = String> {
    "[a-zñ]{1,8}"
}

fn progress() -> impl Strategy<Value = TopicProgress> {
    (
        prop::collection::btree_set(word(), 0..6),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(words, lesson, practice)| {
            let mut sections = BTreeSet::new();
            if lesson {
                sections.insert(Section::Lesson);
            }
            if practice {
                sections.insert(Section::Practice);
            }
            TopicProgress {
                completed_vocabulary: words,
                completed_sections: sections,
            }
        })
}

fn section() -> impl Strategy<Value = Section> {
    prop_oneof![Just(Section::Lesson), Just(Section::Practice)]
}

fn question(i: usize) -> QuizQuestion {
    let options: Vec<String> = (0..4).map(|o| format!("q{i}-o{o}")).collect();
    QuizQuestion {
        question: format!("q{i}"),
        correct_answer: options[i % 4].clone(),
        options,
        explanation: None,
    }
}

proptest! {
    #[test]
    fn double_toggle_is_identity(p in progress(), w in word()) {
        let once = TopicProgress {
            completed_vocabulary: p.toggled_vocabulary(&w),
            ..p.clone()
        };
        let twice = once.toggled_vocabulary(&w);
        prop_assert_eq!(twice, p.completed_vocabulary);
    }

    #[test]
    fn completing_a_section_is_idempotent(p in progress(), s in section()) {
        let update = ProgressUpdate::complete_section(s);
        let once = p.merged(&update);
        prop_assert_eq!(once.merged(&update), once.clone());
        prop_assert!(once.has_section(s));
        prop_assert_eq!(&once.completed_vocabulary, &p.completed_vocabulary);
    }

    #[test]
    fn section_completion_order_does_not_matter(p in progress(), a in section(), b in section()) {
        let ab = p
            .merged(&ProgressUpdate::complete_section(a))
            .merged(&ProgressUpdate::complete_section(b));
        let ba = p
            .merged(&ProgressUpdate::complete_section(b))
            .merged(&ProgressUpdate::complete_section(a));
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn vocabulary_replacement_never_drops_sections(p in progress(), words in prop::collection::btree_set(word(), 0..6)) {
        let next = p.merged(&ProgressUpdate::replace_vocabulary(words.clone()));
        prop_assert_eq!(next.completed_vocabulary, words);
        prop_assert_eq!(next.completed_sections, p.completed_sections);
    }

    #[test]
    fn score_counts_exact_matches(picks in prop::collection::vec(prop::option::of(0usize..4), 25)) {
        let questions: Vec<QuizQuestion> = (0..25).map(question).collect();
        let answers: Vec<Option<String>> = picks
            .iter()
            .zip(&questions)
            .map(|(pick, q)| pick.map(|o| q.options[o].clone()))
            .collect();

        let expected = picks
            .iter()
            .enumerate()
            .filter(|(i, pick)| **pick == Some(i % 4))
            .count() as u32;

        prop_assert_eq!(score(&questions, &answers), expected);
        prop_assert_eq!(score(&questions, &answers), score(&questions, &answers));
        prop_assert!(score(&questions, &answers) <= questions.len() as u32);
    }
}
