//! Post-run mnemonic coaching.

use crate::config::Locale;
use crate::discipline::Discipline;
use crate::error::AdviceError;
use crate::sequence::Sequence;

const IMAGES_SAMPLE: &str = "Sequence of abstract images";

/// Produces free-text mnemonic advice for a short sample of a sequence.
pub trait Advisor: Send + Sync {
    fn advise(
        &self,
        sample: &[String],
        discipline_label: &str,
        locale: Locale,
    ) -> Result<String, AdviceError>;
}

/// The slice of a run the advisor gets to see.
pub fn sample_for(sequence: &Sequence) -> Vec<String> {
    match sequence {
        Sequence::Numbers(s) => vec![s.chars().take(10).collect()],
        Sequence::Binaries(s) => vec![s.chars().take(12).collect()],
        Sequence::Cards(v) => v.iter().take(5).map(|c| c.face.to_string()).collect(),
        Sequence::Words(v) => v.iter().take(5).cloned().collect(),
        Sequence::Names(v) => v.iter().take(3).map(|n| n.name.clone()).collect(),
        Sequence::Images(_) => vec![IMAGES_SAMPLE.to_string()],
        Sequence::Colors(v) => v.iter().take(4).map(|c| c.name().to_string()).collect(),
    }
}

/// Shown when the advisor fails outright.
pub fn fallback_tip(locale: Locale) -> &'static str {
    match locale {
        Locale::En => {
            "Visualization is key. Try to link each item to the next with a vivid action."
        }
        Locale::Uk => "Візуалізація - це ключ. Спробуйте пов'язати кожен елемент з наступним за допомогою яскравої дії.",
    }
}

/// Shown when the advisor answers with nothing.
pub fn empty_reply_tip(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Keep practicing! Try visualizing interaction between items.",
        Locale::Uk => "Продовжуйте тренуватися! Спробуйте візуалізувати взаємодію між предметами.",
    }
}

/// Never fails: advisor errors and blank replies become fixed tips.
pub fn advise_or_fallback(
    advisor: &dyn Advisor,
    sequence: &Sequence,
    discipline_label: &str,
    locale: Locale,
) -> String {
    let sample = sample_for(sequence);
    match advisor.advise(&sample, discipline_label, locale) {
        Ok(text) if text.trim().is_empty() => empty_reply_tip(locale).to_string(),
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(
                %err,
                discipline = discipline_label,
                "advisor failed, using fallback tip"
            );
            fallback_tip(locale).to_string()
        }
    }
}

/// A memory technique suited to one discipline, as shown in the guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Technique {
    pub discipline: Discipline,
    pub title: &'static str,
    pub method: &'static str,
    pub how: &'static str,
}

const GUIDE_ORDER: [Discipline; 6] = [
    Discipline::Numbers,
    Discipline::Cards,
    Discipline::Images,
    Discipline::Names,
    Discipline::Colors,
    Discipline::Words,
];

/// Techniques in guide order. Binaries have no dedicated entry.
pub fn techniques(locale: Locale) -> Vec<Technique> {
    GUIDE_ORDER
        .iter()
        .filter_map(|&d| technique_for(d, locale))
        .collect()
}

pub fn technique_for(discipline: Discipline, locale: Locale) -> Option<Technique> {
    let (title, method, how) = match (discipline, locale) {
        (Discipline::Numbers, Locale::En) => (
            "Numbers",
            "The Major System is the gold standard.",
            "Assign a consonant sound to each digit (0-9). For example: 0=s/z, 1=t/d, 2=n, \
             3=m, 4=r, 5=l, 6=j/sh, 7=k/g, 8=f/v, 9=p/b. Create words from pairs or triplets \
             of numbers and place them in a Memory Palace.",
        ),
        (Discipline::Numbers, Locale::Uk) => (
            "Числа",
            "Головна система (Major System) є золотим стандартом.",
            "Призначте приголосний звук кожній цифрі (0-9). Створюйте слова з пар або трійок \
             чисел і розміщуйте їх у Палаці Пам'яті.",
        ),
        (Discipline::Cards, Locale::En) => (
            "Cards",
            "PAO (Person-Action-Object) System.",
            "Assign a specific Person, Action, and Object to every card in the deck. When you \
             see three cards, use the Person of the first, Action of the second, and Object of \
             the third to create a unique, memorable scene.",
        ),
        (Discipline::Cards, Locale::Uk) => (
            "Карти",
            "Система ПДО (Персона-Дія-Об'єкт).",
            "Призначте конкретну Персону, Дію та Об'єкт кожній карті в колоді. Коли ви бачите \
             три карти, використовуйте Персону першої, Дію другої та Об'єкт третьої, щоб \
             створити унікальну сцену.",
        ),
        (Discipline::Images, Locale::En) => (
            "Images",
            "The Story Method or Linking.",
            "Create a vivid narrative that links each image to the next. If you see a \"Cat\" \
             then a \"Toaster\", imagine a Cat jumping into a Toaster. The more absurd and \
             emotional the visualization, the better it sticks.",
        ),
        (Discipline::Images, Locale::Uk) => (
            "Картинки",
            "Метод історій або ланцюжок.",
            "Створіть яскраву розповідь, яка пов'язує кожне зображення з наступним. Чим \
             абсурдніша та емоційніша візуалізація, тим краще вона запам'ятовується.",
        ),
        (Discipline::Names, Locale::En) => (
            "Faces",
            "Feature Association.",
            "Pick a distinctive feature on the face (e.g., big nose). Associate the name with a \
             concrete image (e.g., \"Mike\" -> \"Microphone\"). Visualize a microphone \
             balancing on the big nose.",
        ),
        (Discipline::Names, Locale::Uk) => (
            "Обличчя",
            "Асоціація рис.",
            "Виберіть характерну рису обличчя. Пов'яжіть ім'я з конкретним образом. \
             Візуалізуйте цей образ, що взаємодіє з характерною рисою.",
        ),
        (Discipline::Colors, Locale::En) => (
            "Colors",
            "Object Association.",
            "Associate each color with a fixed object. Red = Apple, Blue = Ocean, Green = Grass. \
             When you see a sequence, link these objects together using the Story Method.",
        ),
        (Discipline::Colors, Locale::Uk) => (
            "Кольори",
            "Асоціація об'єктів.",
            "Пов'яжіть кожен колір з фіксованим об'єктом. Червоний = Яблуко, Синій = Океан. \
             Пов'язуйте ці об'єкти за допомогою Методу історій.",
        ),
        (Discipline::Words, Locale::En) => (
            "Words",
            "Memory Palace.",
            "Place each word (converted to an image) along a familiar route (your house, walk \
             to work). Retrieving the words is simply a matter of \"walking\" through your \
             palace.",
        ),
        (Discipline::Words, Locale::Uk) => (
            "Слова",
            "Палац пам'яті.",
            "Розмістіть кожне слово (перетворене на образ) вздовж знайомого маршруту. \
             Відтворення слів - це просто \"прогулянка\" вашим палацом.",
        ),
        (Discipline::Binaries, _) => return None,
    };
    Some(Technique {
        discipline,
        title,
        method,
        how,
    })
}

/// Guide heading and subtitle.
pub fn guide_heading(locale: Locale) -> (&'static str, &'static str) {
    match locale {
        Locale::En => ("Rules & Tips", "Learn techniques"),
        Locale::Uk => ("Правила та Поради", "Вивчення технік"),
    }
}

/// Offline advisor that strings the sample into a link-method story.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkMethodAdvisor;

impl LinkMethodAdvisor {
    fn links(sample: &[String], locale: Locale) -> String {
        let joiner = match locale {
            Locale::En => " crashes into ",
            Locale::Uk => " врізається в ",
        };
        sample.join(joiner)
    }
}

impl Advisor for LinkMethodAdvisor {
    fn advise(
        &self,
        sample: &[String],
        discipline_label: &str,
        locale: Locale,
    ) -> Result<String, AdviceError> {
        if sample.iter().all(|s| s.trim().is_empty()) {
            return Err(AdviceError::EmptySample);
        }
        let label = discipline_label.to_lowercase();
        let story = Self::links(sample, locale);
        let text = match (locale, sample.len()) {
            (Locale::En, 1) => format!(
                "Chunk your {label} into pairs and turn each pair into a person or object. \
                 Place them one by one along a familiar route: {story}. \
                 Walk the route again during recall and read them back."
            ),
            (Locale::En, _) => format!(
                "Link method: make each item collide with the next in an absurd, vivid scene. \
                 {story}. The stranger the action, the longer it sticks. \
                 Replay the chain once before the timer runs out."
            ),
            (Locale::Uk, 1) => format!(
                "Розбийте {label} на пари і перетворіть кожну пару на людину чи предмет. \
                 Розставте їх уздовж знайомого маршруту: {story}. \
                 Під час відтворення пройдіть маршрут ще раз."
            ),
            (Locale::Uk, _) => format!(
                "Метод ланцюжка: нехай кожен елемент зіткнеться з наступним у яскравій сцені. \
                 {story}. Що дивніша дія, то довше вона запам'ятовується. \
                 Прокрутіть ланцюжок ще раз до кінця часу."
            ),
        };
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::{standard_deck, ImageRef, NameFace, PaletteColor};

    struct Broken;

    impl Advisor for Broken {
        fn advise(&self, _: &[String], _: &str, _: Locale) -> Result<String, AdviceError> {
            Err(AdviceError::Unavailable("offline".into()))
        }
    }

    struct Silent;

    impl Advisor for Silent {
        fn advise(&self, _: &[String], _: &str, _: Locale) -> Result<String, AdviceError> {
            Ok("   ".into())
        }
    }

    #[test]
    fn samples_are_short_prefixes() {
        let digits = Sequence::Numbers("0123456789012345".into());
        assert_eq!(sample_for(&digits), vec!["0123456789".to_string()]);

        let bits = Sequence::Binaries("10".repeat(20));
        assert_eq!(sample_for(&bits)[0].len(), 12);

        let cards = Sequence::Cards(standard_deck());
        assert_eq!(sample_for(&cards), ["A♠", "2♠", "3♠", "4♠", "5♠"]);

        let names = Sequence::Names(
            ["a", "b", "c", "d"]
                .iter()
                .map(|n| NameFace {
                    name: n.to_string(),
                    portrait: String::new(),
                })
                .collect(),
        );
        assert_eq!(sample_for(&names), ["a", "b", "c"]);

        let images = Sequence::Images(vec![ImageRef("picsum:x".into())]);
        assert_eq!(sample_for(&images), [IMAGES_SAMPLE]);

        let colors = Sequence::Colors(PaletteColor::ALL.to_vec());
        assert_eq!(sample_for(&colors), ["Red", "Orange", "Yellow", "Green"]);
    }

    #[test]
    fn failing_advisor_yields_localized_fallback() {
        let seq = Sequence::Words(vec!["Moon".into()]);
        assert_eq!(
            advise_or_fallback(&Broken, &seq, "Words", Locale::Uk),
            fallback_tip(Locale::Uk)
        );
        assert_eq!(
            advise_or_fallback(&Silent, &seq, "Words", Locale::En),
            empty_reply_tip(Locale::En)
        );
    }

    #[test]
    fn link_method_mentions_every_sampled_item() {
        let seq = Sequence::Words(vec!["Moon".into(), "Kite".into(), "Robot".into()]);
        let text = advise_or_fallback(&LinkMethodAdvisor, &seq, "Words", Locale::En);
        assert!(text.contains("Moon crashes into Kite crashes into Robot"));
    }

    #[test]
    fn link_method_rejects_blank_sample() {
        assert_eq!(
            LinkMethodAdvisor.advise(&[String::new()], "Numbers", Locale::En),
            Err(AdviceError::EmptySample)
        );
    }

    #[test]
    fn guide_covers_six_disciplines_in_both_locales() {
        for locale in [Locale::En, Locale::Uk] {
            let guide = techniques(locale);
            let order: Vec<_> = guide.iter().map(|t| t.discipline).collect();
            assert_eq!(order, GUIDE_ORDER.to_vec());
            assert!(guide.iter().all(|t| !t.method.is_empty() && !t.how.is_empty()));
        }
        assert!(technique_for(Discipline::Binaries, Locale::En).is_none());
    }

    #[test]
    fn guide_text_follows_locale() {
        let en = technique_for(Discipline::Cards, Locale::En).unwrap();
        let uk = technique_for(Discipline::Cards, Locale::Uk).unwrap();
        assert!(en.method.starts_with("PAO"));
        assert_eq!(uk.title, "Карти");
        assert!(uk.how.contains("Персону"));
        assert!(technique_for(Discipline::Numbers, Locale::En)
            .unwrap()
            .how
            .contains("0=s/z"));
    }
}
