// src/utils/nickname.rs

use rand::seq::SliceRandom;

const ADJECTIVES: [&str; 7] = ["부유한", "똑똑한", "배고픈", "성실한", "행복한", "즐거운", "대박난"];
const NOUNS: [&str; 7] = ["개미", "워렌버핏", "지갑", "금고", "투자자", "나무", "저금통"];

/// Random "adjective + noun" nickname for users who did not pick one.
pub fn make_nickname() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("부유한");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("개미");
    format!("{}{}", adjective, noun)
}
