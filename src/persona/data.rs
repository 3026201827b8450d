// src/persona/data.rs

//! Static questionnaire and archetype tables.
//!
//! Score vectors follow [`ARCHETYPES`] order:
//! turtle, squirrel, owl, dolphin, lion.

use super::{Animal, AnswerOption, Question};

pub const ARCHETYPES: [&str; 5] = ["turtle", "squirrel", "owl", "dolphin", "lion"];

const fn opt(text: &'static str, scores: [i64; 5]) -> AnswerOption {
    AnswerOption { text, scores }
}

pub static QUESTIONS: [Question; 10] = [
    Question {
        id: 1,
        question: "여유 자금 1,000만 원이 생겼다면 어떻게 할까요?",
        options: &[
            opt("일단 예금에 넣어 둔다", [3, 1, 0, 0, 0]),
            opt("매달 조금씩 나눠서 적금과 적립식 투자에 넣는다", [1, 3, 0, 1, 0]),
            opt("여러 종목을 공부한 뒤 분산 투자한다", [0, 0, 3, 1, 0]),
            opt("요즘 뜨는 테마에 빠르게 올라탄다", [0, 0, 0, 3, 1]),
            opt("확신이 드는 성장주에 한 번에 투자한다", [0, 0, 0, 1, 3]),
        ],
    },
    Question {
        id: 2,
        question: "투자한 자산이 한 달 만에 20% 떨어졌습니다.",
        options: &[
            opt("더 떨어지기 전에 전부 판다", [3, 0, 0, 1, 0]),
            opt("원래 계획대로 매달 사던 만큼만 계속 산다", [0, 3, 1, 0, 0]),
            opt("하락 원인을 분석하고 나서 결정한다", [0, 0, 3, 0, 1]),
            opt("분위기가 바뀔 때까지 지켜본다", [1, 0, 0, 3, 0]),
            opt("싸게 살 기회라며 추가로 매수한다", [0, 0, 1, 0, 3]),
        ],
    },
    Question {
        id: 3,
        question: "가장 중요하게 생각하는 투자 목표는 무엇인가요?",
        options: &[
            opt("원금을 절대 잃지 않는 것", [3, 1, 0, 0, 0]),
            opt("목돈을 차곡차곡 모으는 것", [1, 3, 0, 0, 0]),
            opt("시장보다 조금 더 나은 수익", [0, 1, 3, 1, 0]),
            opt("기회가 보이면 놓치지 않는 것", [0, 0, 0, 3, 1]),
            opt("짧은 시간에 자산을 크게 불리는 것", [0, 0, 0, 1, 3]),
        ],
    },
    Question {
        id: 4,
        question: "투자 정보를 주로 어디서 얻나요?",
        options: &[
            opt("은행 창구나 지인의 추천", [3, 1, 0, 0, 0]),
            opt("가계부와 저축 앱", [0, 3, 1, 0, 0]),
            opt("재무제표와 리포트", [0, 0, 3, 0, 1]),
            opt("커뮤니티와 뉴스 헤드라인", [0, 0, 0, 3, 1]),
            opt("내 감과 경험", [0, 0, 0, 1, 3]),
        ],
    },
    Question {
        id: 5,
        question: "투자 기간은 어느 정도를 생각하나요?",
        options: &[
            opt("언제든 꺼낼 수 있어야 한다", [3, 0, 0, 1, 0]),
            opt("1~3년 동안 꾸준히 모은다", [1, 3, 0, 0, 0]),
            opt("5년 이상 길게 본다", [0, 1, 3, 0, 1]),
            opt("상황을 보며 그때그때 바꾼다", [0, 0, 0, 3, 0]),
            opt("몇 달 안에 승부를 본다", [0, 0, 0, 1, 3]),
        ],
    },
    Question {
        id: 6,
        question: "월급이 들어오면 가장 먼저 하는 일은?",
        options: &[
            opt("고정 지출부터 빼고 나머지는 통장에 둔다", [3, 1, 0, 0, 0]),
            opt("정해 둔 금액을 자동이체로 저축한다", [0, 3, 1, 0, 0]),
            opt("이번 달 자산 배분을 점검한다", [0, 1, 3, 0, 0]),
            opt("눈여겨본 종목이 있는지 확인한다", [0, 0, 0, 3, 1]),
            opt("투자 계좌로 최대한 옮긴다", [0, 0, 0, 0, 3]),
        ],
    },
    Question {
        id: 7,
        question: "친구가 '확실한 종목'이라며 투자를 권합니다.",
        options: &[
            opt("관심 없다, 내 돈은 안전한 곳에", [3, 1, 0, 0, 0]),
            opt("적금 만기가 될 때까지 기다린다", [1, 3, 0, 0, 0]),
            opt("회사 정보를 직접 찾아본다", [0, 0, 3, 0, 0]),
            opt("조금만 넣어서 분위기를 본다", [0, 0, 1, 3, 0]),
            opt("좋은 기회라면 크게 베팅한다", [0, 0, 0, 0, 3]),
        ],
    },
    Question {
        id: 8,
        question: "감당할 수 있는 최대 손실은 어느 정도인가요?",
        options: &[
            opt("손실은 감당하기 어렵다", [3, 1, 0, 0, 0]),
            opt("5% 정도까지", [1, 3, 0, 0, 0]),
            opt("10~20% 정도까지", [0, 0, 3, 1, 0]),
            opt("30% 정도까지", [0, 0, 1, 3, 1]),
            opt("수익을 위해서라면 그 이상도 괜찮다", [0, 0, 0, 0, 3]),
        ],
    },
    Question {
        id: 9,
        question: "새로운 금융 상품이 출시됐습니다.",
        options: &[
            opt("검증될 때까지 기다린다", [3, 0, 1, 0, 0]),
            opt("금리나 혜택이 좋으면 바로 가입한다", [0, 3, 0, 1, 0]),
            opt("약관과 구조를 꼼꼼히 비교한다", [0, 0, 3, 0, 0]),
            opt("사람들 반응이 좋으면 따라 가입한다", [0, 0, 0, 3, 0]),
            opt("남들보다 먼저 선점한다", [0, 0, 0, 1, 3]),
        ],
    },
    Question {
        id: 10,
        question: "나에게 돈이란?",
        options: &[
            opt("지켜야 할 안전망", [3, 1, 0, 0, 0]),
            opt("조금씩 쌓아 가는 성취", [0, 3, 0, 0, 0]),
            opt("공부한 만큼 불어나는 결과", [0, 0, 3, 0, 1]),
            opt("흐름을 타면 늘어나는 기회", [0, 0, 0, 3, 0]),
            opt("도전을 위한 무기", [0, 0, 0, 1, 3]),
        ],
    },
];

pub static ANIMALS: [Animal; 5] = [
    Animal {
        key: "turtle",
        name: "신중한 거북이",
        description: "원금 보전이 최우선인 안정 추구형입니다. 예금과 같은 확정 금리 상품에서 마음의 평화를 얻어요.",
        stats: &[("안정성", 95), ("수익성", 30), ("분석력", 50), ("유연성", 35), ("과감성", 10)],
    },
    Animal {
        key: "squirrel",
        name: "부지런한 다람쥐",
        description: "매달 꾸준히 모으는 적립형입니다. 적금과 적립식 투자로 목돈을 차곡차곡 만들어 가요.",
        stats: &[("안정성", 80), ("수익성", 45), ("분석력", 55), ("유연성", 50), ("과감성", 25)],
    },
    Animal {
        key: "owl",
        name: "지혜로운 부엉이",
        description: "데이터와 근거로 판단하는 분석형입니다. 분산 투자와 장기 투자로 시장보다 나은 성과를 노려요.",
        stats: &[("안정성", 60), ("수익성", 65), ("분석력", 95), ("유연성", 55), ("과감성", 45)],
    },
    Animal {
        key: "dolphin",
        name: "영리한 돌고래",
        description: "시장의 흐름을 읽고 유연하게 움직이는 트렌드형입니다. 기회가 보이면 빠르게 올라타요.",
        stats: &[("안정성", 45), ("수익성", 75), ("분석력", 60), ("유연성", 95), ("과감성", 65)],
    },
    Animal {
        key: "lion",
        name: "용맹한 사자",
        description: "높은 수익을 위해 위험을 감수하는 공격형입니다. 성장주와 레버리지 상품에도 과감하게 도전해요.",
        stats: &[("안정성", 20), ("수익성", 95), ("분석력", 55), ("유연성", 60), ("과감성", 95)],
    },
];
