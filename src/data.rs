/// Built-in vocabulary, seeded into an empty store. Levels run from grade school to university.
pub struct WordSeed {
    pub term: &'static str,
    pub pronunciation: &'static str,
    pub meaning: &'static str,
    pub level: &'static str,
}

pub const DEFAULT_WORDS: &[WordSeed] = &[
    WordSeed { term: "cat", pronunciation: "/kæt/", meaning: "猫", level: "小学" },
    WordSeed { term: "dog", pronunciation: "/dɔːɡ/", meaning: "狗", level: "小学" },
    WordSeed { term: "book", pronunciation: "/bʊk/", meaning: "书", level: "小学" },
    WordSeed { term: "pen", pronunciation: "/pen/", meaning: "钢笔", level: "小学" },
    WordSeed { term: "apple", pronunciation: "/ˈæpl/", meaning: "苹果", level: "小学" },
    WordSeed { term: "water", pronunciation: "/ˈwɔːtər/", meaning: "水", level: "小学" },
    WordSeed { term: "food", pronunciation: "/fuːd/", meaning: "食物", level: "小学" },
    WordSeed { term: "house", pronunciation: "/haʊs/", meaning: "房子", level: "小学" },
    WordSeed { term: "car", pronunciation: "/kɑːr/", meaning: "汽车", level: "小学" },
    WordSeed { term: "tree", pronunciation: "/triː/", meaning: "树", level: "小学" },
    WordSeed { term: "sun", pronunciation: "/sʌn/", meaning: "太阳", level: "小学" },
    WordSeed { term: "moon", pronunciation: "/muːn/", meaning: "月亮", level: "小学" },
    WordSeed { term: "computer", pronunciation: "/kəmˈpjuːtər/", meaning: "电脑", level: "初中" },
    WordSeed { term: "internet", pronunciation: "/ˈɪntərnet/", meaning: "互联网", level: "初中" },
    WordSeed { term: "telephone", pronunciation: "/ˈteləfoʊn/", meaning: "电话", level: "初中" },
    WordSeed { term: "television", pronunciation: "/ˈteləvɪʒn/", meaning: "电视", level: "初中" },
    WordSeed { term: "music", pronunciation: "/ˈmjuːzɪk/", meaning: "音乐", level: "初中" },
    WordSeed { term: "movie", pronunciation: "/ˈmuːvi/", meaning: "电影", level: "初中" },
    WordSeed { term: "sport", pronunciation: "/spɔːrt/", meaning: "运动", level: "初中" },
    WordSeed { term: "football", pronunciation: "/ˈfʊtbɔːl/", meaning: "足球", level: "初中" },
    WordSeed { term: "basketball", pronunciation: "/ˈbæskɪtbɔːl/", meaning: "篮球", level: "初中" },
    WordSeed { term: "swimming", pronunciation: "/ˈswɪmɪŋ/", meaning: "游泳", level: "初中" },
    WordSeed { term: "science", pronunciation: "/ˈsaɪəns/", meaning: "科学", level: "初中" },
    WordSeed { term: "mathematics", pronunciation: "/ˌmæθəˈmætɪks/", meaning: "数学", level: "初中" },
    WordSeed { term: "achievement", pronunciation: "/əˈtʃiːvmənt/", meaning: "成就", level: "高中" },
    WordSeed { term: "opportunity", pronunciation: "/ˌɑːpərˈtuːnəti/", meaning: "机会", level: "高中" },
    WordSeed { term: "experience", pronunciation: "/ɪkˈspɪriəns/", meaning: "经验", level: "高中" },
    WordSeed { term: "development", pronunciation: "/dɪˈveləpmənt/", meaning: "发展", level: "高中" },
    WordSeed { term: "environment", pronunciation: "/ɪnˈvaɪrənmənt/", meaning: "环境", level: "高中" },
    WordSeed { term: "technology", pronunciation: "/tekˈnɑːlədʒi/", meaning: "技术", level: "高中" },
    WordSeed { term: "information", pronunciation: "/ˌɪnfərˈmeɪʃn/", meaning: "信息", level: "高中" },
    WordSeed { term: "communication", pronunciation: "/kəˌmjuːnɪˈkeɪʃn/", meaning: "交流", level: "高中" },
    WordSeed { term: "organization", pronunciation: "/ˌɔːrɡənəˈzeɪʃn/", meaning: "组织", level: "高中" },
    WordSeed { term: "responsibility", pronunciation: "/rɪˌspɑːnsəˈbɪləti/", meaning: "责任", level: "高中" },
    WordSeed { term: "government", pronunciation: "/ˈɡʌvərnmənt/", meaning: "政府", level: "高中" },
    WordSeed { term: "democracy", pronunciation: "/dɪˈmɑːkrəsi/", meaning: "民主", level: "高中" },
    WordSeed { term: "sophisticated", pronunciation: "/səˈfɪstɪkeɪtɪd/", meaning: "复杂的", level: "大学" },
    WordSeed { term: "comprehensive", pronunciation: "/ˌkɑːmprɪˈhensɪv/", meaning: "全面的", level: "大学" },
    WordSeed { term: "extraordinary", pronunciation: "/ɪkˈstrɔːrdəneri/", meaning: "非凡的", level: "大学" },
    WordSeed { term: "revolutionary", pronunciation: "/ˌrevəˈluːʃəneri/", meaning: "革命性的", level: "大学" },
    WordSeed { term: "unprecedented", pronunciation: "/ʌnˈpresɪdentɪd/", meaning: "史无前例的", level: "大学" },
    WordSeed { term: "philosophical", pronunciation: "/ˌfɪləˈsɑːfɪkl/", meaning: "哲学的", level: "大学" },
    WordSeed { term: "psychological", pronunciation: "/ˌsaɪkəˈlɑːdʒɪkl/", meaning: "心理的", level: "大学" },
    WordSeed { term: "entrepreneurial", pronunciation: "/ˌɑːntrəprəˈnɜːriəl/", meaning: "企业家的", level: "大学" },
    WordSeed { term: "interdisciplinary", pronunciation: "/ˌɪntərdɪsəˈplɪneri/", meaning: "跨学科的", level: "大学" },
    WordSeed { term: "metamorphosis", pronunciation: "/ˌmetəˈmɔːrfəsɪs/", meaning: "变形", level: "大学" },
    WordSeed { term: "paradigm", pronunciation: "/ˈpærədaɪm/", meaning: "范式", level: "大学" },
    WordSeed { term: "hypothesis", pronunciation: "/haɪˈpɑːθəsɪs/", meaning: "假设", level: "大学" },
];
